//! Memory Store Module
//!
//! In-process `KvStore` backend. Every operation runs under one write lock, so
//! set-if-absent, compare-and-delete and increment-and-expire are atomic the
//! same way their Redis counterparts are.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{KvStore, StoreEntry, MAX_KEY_LENGTH};
use crate::error::StoreError;

// == Memory Store ==
/// Shared in-process store with lazy expiry on access.
///
/// Cloning is cheap; all clones see the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoreEntry>>>,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remaining TTL of a live key, None if absent or without expiry.
    pub async fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(StoreEntry::ttl_remaining_ms)
    }
}

fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::Protocol(format!(
            "Key must be 1..={} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Drops `key` if it has expired, so callers only ever see live entries.
fn purge_if_expired(entries: &mut HashMap<String, StoreEntry>, key: &str) {
    if entries.get(key).is_some_and(StoreEntry::is_expired) {
        entries.remove(key);
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        check_key(key)?;
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        check_key(key)?;
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), StoreEntry::new(value.to_vec(), Some(ttl)));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        check_key(key)?;
        let mut entries = self.entries.write().await;
        purge_if_expired(&mut entries, key);
        Ok(entries.remove(key).is_some())
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        check_key(key)?;
        let mut entries = self.entries.write().await;
        purge_if_expired(&mut entries, key);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), StoreEntry::new(value.to_vec(), Some(ttl)));
        Ok(true)
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool, StoreError> {
        check_key(key)?;
        let mut entries = self.entries.write().await;
        purge_if_expired(&mut entries, key);
        match entries.get(key) {
            Some(entry) if entry.value == expected => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn incr_with_expire(&self, key: &str, ttl_if_new: Duration) -> Result<i64, StoreError> {
        check_key(key)?;
        let mut entries = self.entries.write().await;
        purge_if_expired(&mut entries, key);

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| StoreEntry::new(b"0".to_vec(), None));

        let current: i64 = std::str::from_utf8(&entry.value)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                StoreError::Protocol(format!("Value at '{}' is not an integer", key))
            })?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::Protocol(format!("Counter overflow at '{}'", key)))?;

        entry.value = next.to_string().into_bytes();
        if next == 1 {
            entry.expire_in(ttl_if_new);
        }
        Ok(next)
    }
}
