//! TTL Jitter
//!
//! Spreads expiry of keys written at the same instant so they do not all
//! rebuild at once.

use std::time::Duration;

use rand::Rng;

/// Returns `base` plus a uniformly random whole number of seconds in
/// `0..=jitter_seconds`.
pub fn with_jitter(base: Duration, jitter_seconds: u64) -> Duration {
    if jitter_seconds == 0 {
        return base;
    }
    let extra = rand::thread_rng().gen_range(0..=jitter_seconds);
    base + Duration::from_secs(extra)
}
