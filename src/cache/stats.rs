//! Cache Statistics Module
//!
//! Lock-free counters updated by the cache-aside orchestrator from many
//! concurrent requests, plus a serializable snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Metrics ==
/// Live counters shared by all requests.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    rebuilds: AtomicU64,
    lock_waits: AtomicU64,
    wait_hits: AtomicU64,
    fallbacks: AtomicU64,
    store_errors: AtomicU64,
    decode_errors: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A request won the rebuild lock and invoked the loader.
    pub fn record_rebuild(&self) {
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    /// A request lost the rebuild lock and started polling.
    pub fn record_lock_wait(&self) {
        self.lock_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// A polling request found the value written by the rebuilder.
    pub fn record_wait_hit(&self) {
        self.wait_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// The loader was called directly, without writing the cache.
    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            lock_waits: self.lock_waits.load(Ordering::Relaxed),
            wait_hits: self.wait_hits.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}

// == Cache Stats ==
/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads answered from the cache on the first lookup
    pub hits: u64,
    /// First lookups that found nothing usable
    pub misses: u64,
    pub rebuilds: u64,
    pub lock_waits: u64,
    pub wait_hits: u64,
    pub fallbacks: u64,
    /// Absorbed failures of the store (read, write, lock)
    pub store_errors: u64,
    pub decode_errors: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
