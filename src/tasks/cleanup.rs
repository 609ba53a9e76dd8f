//! Expired Entry Cleanup Task
//!
//! Background task that periodically purges expired keys from the in-process
//! store. Redis expires keys itself, so this only runs for `MemoryStore`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryStore;

/// Spawns a task that removes expired entries every `cleanup_interval_secs`.
///
/// Returns the JoinHandle so shutdown can abort it.
pub fn spawn_cleanup_task(store: MemoryStore, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting store cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired().await;
            if removed > 0 {
                info!("Store cleanup: removed {} expired entries", removed);
            } else {
                debug!("Store cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KvStore;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let store = MemoryStore::new();
        store
            .set_ex("expire_soon", b"v", Duration::from_millis(200))
            .await
            .unwrap();
        store
            .set_ex("long_lived", b"v", Duration::from_secs(3600))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.len().await, 1, "only the expired entry should be purged");
        assert!(store.get("long_lived").await.unwrap().is_some());

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(MemoryStore::new(), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
