//! Key-Value Store Port
//!
//! The atomic single-key primitives the cache, lock and rate limiter are built
//! on. Implemented by the Redis backend and the in-process `MemoryStore`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Atomic single-key operations against an external store.
///
/// Every method is a single round trip and atomic on the store side, so the
/// coordination built on top is correct across service instances.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the raw bytes for `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value and TTL.
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;

    /// Removes `key`. Returns whether something was deleted.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Stores `value` only if `key` is absent. Returns whether it was stored.
    async fn set_nx_ex(&self, key: &str, value: &[u8], ttl: Duration)
        -> Result<bool, StoreError>;

    /// Deletes `key` only if its current value equals `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool, StoreError>;

    /// Increments the counter at `key`; when the result is 1 the key gets
    /// `ttl_if_new` as expiry in the same atomic step.
    async fn incr_with_expire(&self, key: &str, ttl_if_new: Duration) -> Result<i64, StoreError>;
}
