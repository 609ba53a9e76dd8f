//! Distributed Lock
//!
//! Token-based mutual exclusion on top of the store's set-if-absent and
//! compare-and-delete. A lock is released only by the holder of the token it
//! was acquired with; the TTL frees it if the holder never does.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::KvStore;
use crate::error::StoreError;

/// Opaque value proving ownership of one acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    /// A fresh token; never reused across acquisition attempts.
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// == Distributed Lock ==
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn KvStore>,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Attempts to take `key` for `ttl`. `Ok(None)` means someone else holds it.
    pub async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<LockToken>, StoreError> {
        let token = LockToken::generate();
        let acquired = self
            .store
            .set_nx_ex(key, token.as_str().as_bytes(), ttl)
            .await?;

        if acquired {
            debug!(key, "Lock acquired");
            Ok(Some(token))
        } else {
            debug!(key, "Lock held elsewhere");
            Ok(None)
        }
    }

    /// Deletes `key` only if it still holds `token`. A mismatched or expired
    /// token deletes nothing and is not an error.
    pub async fn release(&self, key: &str, token: &LockToken) -> Result<bool, StoreError> {
        let released = self
            .store
            .compare_and_delete(key, token.as_str().as_bytes())
            .await?;
        if !released {
            debug!(key, "Lock already expired or taken over");
        }
        Ok(released)
    }

    /// Like `try_acquire`, but the returned guard releases on every exit.
    pub async fn acquire_guard(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<LockGuard>, StoreError> {
        let token = self.try_acquire(key, ttl).await?;
        Ok(token.map(|token| LockGuard {
            lock: self.clone(),
            key: key.to_string(),
            token: Some(token),
        }))
    }
}

// == Lock Guard ==
/// Held rebuild lock.
///
/// Call [`LockGuard::release`] on normal exits. If the guard is dropped while
/// still holding the token (panic, cancelled future), release is spawned onto
/// the runtime instead; the TTL remains the last resort.
pub struct LockGuard {
    lock: DistributedLock,
    key: String,
    token: Option<LockToken>,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Releases the lock. On a store error the lock is left to expire.
    pub async fn release(mut self) -> Result<bool, StoreError> {
        let Some(token) = self.token.take() else {
            return Ok(false);
        };
        self.lock.release(&self.key, &token).await
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let lock = self.lock.clone();
        let key = std::mem::take(&mut self.key);
        handle.spawn(async move {
            if let Err(err) = lock.release(&key, &token).await {
                warn!(key = %key, error = %err, "Deferred lock release failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    const TTL: Duration = Duration::from_secs(2);

    fn lock_with_store() -> (DistributedLock, MemoryStore) {
        let store = MemoryStore::new();
        (DistributedLock::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_acquire_is_exclusive() {
        let (lock, _) = lock_with_store();

        let first = lock.try_acquire("l", TTL).await.unwrap();
        let second = lock.try_acquire("l", TTL).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let (lock, _) = lock_with_store();

        let a = lock.try_acquire("a", TTL).await.unwrap().unwrap();
        let b = lock.try_acquire("b", TTL).await.unwrap().unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_release_requires_matching_token() {
        let (lock, _) = lock_with_store();
        let token = lock.try_acquire("l", TTL).await.unwrap().unwrap();

        let stranger = LockToken("someone-else".to_string());
        assert!(!lock.release("l", &stranger).await.unwrap());
        assert!(lock.try_acquire("l", TTL).await.unwrap().is_none());

        assert!(lock.release("l", &token).await.unwrap());
        assert!(lock.try_acquire("l", TTL).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_token_cannot_release_new_holder() {
        let (lock, _) = lock_with_store();
        let stale = lock
            .try_acquire("l", Duration::from_millis(30))
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let fresh = lock.try_acquire("l", TTL).await.unwrap().unwrap();
        assert!(!lock.release("l", &stale).await.unwrap());
        assert!(lock.release("l", &fresh).await.unwrap());
    }

    #[tokio::test]
    async fn test_guard_release() {
        let (lock, store) = lock_with_store();
        let guard = lock.acquire_guard("l", TTL).await.unwrap().unwrap();
        assert_eq!(guard.key(), "l");

        assert!(guard.release().await.unwrap());
        assert!(store.get("l").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_in_background() {
        let (lock, store) = lock_with_store();
        let guard = lock.acquire_guard("l", TTL).await.unwrap().unwrap();

        drop(guard);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.get("l").await.unwrap().is_none());
    }
}
