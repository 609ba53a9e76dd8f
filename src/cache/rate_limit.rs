//! Fixed-Window Rate Limiter
//!
//! One counter per (tenant, client, endpoint, window). The first increment in
//! a window sets the counter's expiry, so past windows disappear on their own.
//! Up to twice the limit can pass across a window boundary.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::cache::{CacheKeys, KvStore};
use crate::context::{ClientIdentity, TenantContext};

/// Limit applied to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub window_seconds: u64,
    pub limit: u64,
}

// == Rate Limiter ==
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Counts one request against `key`. Returns whether it is within `limit`.
    ///
    /// Store failures allow the request.
    pub async fn allow(&self, key: &str, window_seconds: u64, limit: u64) -> bool {
        let window = Duration::from_secs(window_seconds.max(1));
        match self.store.incr_with_expire(key, window).await {
            Ok(count) => {
                let allowed = u64::try_from(count).map_or(true, |c| c <= limit);
                if !allowed {
                    debug!(key, count, limit, "Rate limit exceeded");
                }
                allowed
            }
            Err(err) => {
                warn!(key, error = %err, "Rate limiter unavailable, allowing request");
                true
            }
        }
    }

    /// Builds the current window's key for this caller and checks `rule`.
    pub async fn check(
        &self,
        keys: &CacheKeys,
        ctx: &TenantContext,
        client: &ClientIdentity,
        endpoint: &str,
        rule: RateLimitRule,
    ) -> bool {
        let window_start = window_start(now_seconds(), rule.window_seconds);
        let key = keys.rate_limit(ctx, client.as_str(), endpoint, window_start);
        self.allow(&key, rule.window_seconds, rule.limit).await
    }
}

/// `floor(now / window) * window`.
pub fn window_start(now_seconds: u64, window_seconds: u64) -> u64 {
    let window = window_seconds.max(1);
    (now_seconds / window) * window
}

fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
