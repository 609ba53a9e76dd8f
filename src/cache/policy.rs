//! Fail-Open Policy
//!
//! The cache is an optimization only. These functions are the single place
//! where cache-layer failures are logged and turned into "no cache".

use tracing::{debug, warn};

use crate::cache::{CacheCodec, CacheMetrics};
use crate::error::StoreError;

/// Outcome of a cache read once failures have been absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss => None,
        }
    }
}

/// Turns a raw read into a `Lookup`. Absent keys, store errors and bytes that
/// fail to decode are all a `Miss`.
pub fn fail_open<T: CacheCodec>(
    key: &str,
    read: Result<Option<Vec<u8>>, StoreError>,
    metrics: &CacheMetrics,
) -> Lookup<T> {
    match read {
        Ok(Some(bytes)) => match T::decode(&bytes) {
            Ok(value) => Lookup::Hit(value),
            Err(err) => {
                metrics.record_decode_error();
                warn!(key, error = %err, "Discarding undecodable cache entry");
                Lookup::Miss
            }
        },
        Ok(None) => {
            debug!(key, "Cache miss");
            Lookup::Miss
        }
        Err(err) => {
            metrics.record_store_error();
            warn!(key, error = %err, "Cache read failed, treating as miss");
            Lookup::Miss
        }
    }
}

/// Absorbs a store failure for operations whose outcome is optional
/// (write-back, invalidation, lock release). Returns the value on success.
pub fn best_effort<T>(
    key: &str,
    op: &'static str,
    result: Result<T, StoreError>,
    metrics: &CacheMetrics,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            metrics.record_store_error();
            warn!(key, op, error = %err, "Cache operation failed, ignoring");
            None
        }
    }
}
