//! Store Entry Module
//!
//! A single value held by the in-process store, with millisecond expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Store Entry ==
/// Raw bytes plus an optional absolute expiry.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The stored bytes
    pub value: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates an entry expiring `ttl` from now, or never when `ttl` is None.
    pub fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl.map(|ttl| now + ttl.as_millis() as u64);

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiry.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Expire ==
    /// Sets a new expiry `ttl` from now, keeping the value.
    pub fn expire_in(&mut self, ttl: Duration) {
        self.expires_at = Some(current_timestamp_ms() + ttl.as_millis() as u64);
    }

    /// Remaining time to live in milliseconds, None if no expiry is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
