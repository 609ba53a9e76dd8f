//! Cache-Aside Orchestrator
//!
//! Get-or-load over the key-value store with single-flight rebuilds:
//!
//! 1. Read the key; a decodable value is returned.
//! 2. On a miss, try the rebuild lock for the key.
//! 3. The lock holder re-reads once, then calls the loader and writes the
//!    result back. The lock is released on every exit.
//! 4. Everyone else polls the key on a short fixed schedule, and once that is
//!    exhausted calls the loader directly without writing the cache.
//!
//! Store and decode failures never reach the caller; only loader errors do.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::jitter::with_jitter;
use crate::cache::policy::{best_effort, fail_open, Lookup};
use crate::cache::{CacheCodec, CacheMetrics, CacheStats, DistributedLock, KvStore};
use crate::error::LoadError;

/// Poll delays for requests that lose the rebuild lock (~450ms in total).
pub const DEFAULT_WAIT_SCHEDULE_MS: [u64; 4] = [50, 80, 120, 200];

// == Settings ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Base TTL of single-record entries
    pub position_ttl: Duration,
    /// Upper bound of the random seconds added to `position_ttl`
    pub position_ttl_jitter_secs: u64,
    /// TTL of group entries, never jittered
    pub client_list_ttl: Duration,
    /// Expiry of the rebuild lock; bounds how long a stuck rebuilder blocks others
    pub rebuild_lock_ttl: Duration,
    /// Delays between cache checks while another request rebuilds
    pub wait_schedule: Vec<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            position_ttl: Duration::from_secs(30),
            position_ttl_jitter_secs: 10,
            client_list_ttl: Duration::from_secs(20),
            rebuild_lock_ttl: Duration::from_secs(2),
            wait_schedule: DEFAULT_WAIT_SCHEDULE_MS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        }
    }
}

/// Where a value lives and which lock guards its rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSlot {
    pub key: String,
    pub lock_key: String,
}

impl CacheSlot {
    pub fn new(key: impl Into<String>, lock_key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            lock_key: lock_key.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Expiry {
    Jittered { base: Duration, jitter_secs: u64 },
    Fixed(Duration),
}

impl Expiry {
    fn resolve(self) -> Duration {
        match self {
            Expiry::Jittered { base, jitter_secs } => with_jitter(base, jitter_secs),
            Expiry::Fixed(ttl) => ttl,
        }
    }
}

// == Cache Aside ==
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn KvStore>,
    lock: DistributedLock,
    settings: CacheSettings,
    metrics: Arc<CacheMetrics>,
}

impl CacheAside {
    pub fn new(store: Arc<dyn KvStore>, settings: CacheSettings) -> Self {
        Self {
            lock: DistributedLock::new(store.clone()),
            store,
            settings,
            metrics: Arc::new(CacheMetrics::new()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Get-or-load for a single record; written back with a jittered TTL.
    pub async fn get_single<T, F, Fut>(&self, slot: &CacheSlot, loader: F) -> Result<T, LoadError>
    where
        T: CacheCodec,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        let expiry = Expiry::Jittered {
            base: self.settings.position_ttl,
            jitter_secs: self.settings.position_ttl_jitter_secs,
        };
        self.get_or_load(slot, expiry, loader).await
    }

    /// Get-or-load for a group of records; written back with the fixed list TTL.
    pub async fn get_group<T, F, Fut>(&self, slot: &CacheSlot, loader: F) -> Result<T, LoadError>
    where
        T: CacheCodec,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        let expiry = Expiry::Fixed(self.settings.client_list_ttl);
        self.get_or_load(slot, expiry, loader).await
    }

    /// Deletes `keys` after a committed write so the next read is a miss.
    /// Failures are logged and ignored.
    pub async fn invalidate(&self, keys: &[String]) {
        for key in keys {
            let result = self.store.delete(key).await;
            if best_effort(key, "invalidate", result, &self.metrics).is_some() {
                debug!(key = %key, "Invalidated cache entry");
            }
        }
    }

    async fn get_or_load<T, F, Fut>(
        &self,
        slot: &CacheSlot,
        expiry: Expiry,
        loader: F,
    ) -> Result<T, LoadError>
    where
        T: CacheCodec,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        if let Lookup::Hit(value) = self.read(&slot.key).await {
            self.metrics.record_hit();
            return Ok(value);
        }
        self.metrics.record_miss();

        let guard = match self
            .lock
            .acquire_guard(&slot.lock_key, self.settings.rebuild_lock_ttl)
            .await
        {
            Ok(Some(guard)) => guard,
            Ok(None) => return self.wait_then_load(slot, loader).await,
            Err(err) => {
                // Store unreachable: polling it is pointless, go straight to the source.
                self.metrics.record_store_error();
                self.metrics.record_fallback();
                warn!(key = %slot.lock_key, error = %err, "Rebuild lock unavailable, bypassing cache");
                return loader().await;
            }
        };

        let result = self.rebuild(slot, expiry, loader).await;
        best_effort(&slot.lock_key, "release_lock", guard.release().await, &self.metrics);
        result
    }

    async fn rebuild<T, F, Fut>(
        &self,
        slot: &CacheSlot,
        expiry: Expiry,
        loader: F,
    ) -> Result<T, LoadError>
    where
        T: CacheCodec,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        // Another rebuilder may have finished between the first read and the lock.
        if let Lookup::Hit(value) = self.read(&slot.key).await {
            return Ok(value);
        }

        self.metrics.record_rebuild();
        let value = loader().await?;
        self.write_back(&slot.key, &value, expiry.resolve()).await;
        Ok(value)
    }

    async fn wait_then_load<T, F, Fut>(&self, slot: &CacheSlot, loader: F) -> Result<T, LoadError>
    where
        T: CacheCodec,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        self.metrics.record_lock_wait();
        for delay in &self.settings.wait_schedule {
            tokio::time::sleep(*delay).await;
            if let Lookup::Hit(value) = self.read(&slot.key).await {
                self.metrics.record_wait_hit();
                return Ok(value);
            }
        }

        // The in-flight rebuilder will populate the key; do not pile on.
        self.metrics.record_fallback();
        debug!(key = %slot.key, "Wait budget exhausted, loading without write-back");
        loader().await
    }

    async fn read<T: CacheCodec>(&self, key: &str) -> Lookup<T> {
        fail_open(key, self.store.get(key).await, &self.metrics)
    }

    async fn write_back<T: CacheCodec>(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match value.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(key, error = %err, "Value not cacheable, skipping write-back");
                return;
            }
        };
        let result = self.store.set_ex(key, &bytes, ttl).await;
        best_effort(key, "write_back", result, &self.metrics);
    }
}
