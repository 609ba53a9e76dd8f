//! Cache Module
//!
//! Cache-aside reads over an external key-value store: the store port and its
//! backends, the rebuild lock, the rate limiter, TTL jitter and the binary
//! codec for cached positions.

pub mod aside;
pub mod codec;
mod entry;
pub mod jitter;
mod keys;
mod kv;
pub mod lock;
pub mod policy;
pub mod rate_limit;
mod redis_store;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
pub(crate) mod testing;

// Re-export public types
pub use aside::{CacheAside, CacheSettings, CacheSlot};
pub use codec::CacheCodec;
pub use entry::StoreEntry;
pub use keys::CacheKeys;
pub use kv::KvStore;
pub use lock::{DistributedLock, LockGuard, LockToken};
pub use policy::Lookup;
pub use rate_limit::{RateLimitRule, RateLimiter};
pub use redis_store::RedisStore;
pub use stats::{CacheMetrics, CacheStats};
pub use store::MemoryStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 512;
