//! Fault injection for cache tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{KvStore, MemoryStore};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Set,
    Delete,
    SetNx,
    CompareAndDelete,
    Incr,
}

/// `MemoryStore` whose selected operations fail with a backend error.
#[derive(Debug, Clone, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing: Arc<Mutex<HashSet<StoreOp>>>,
}

impl FaultyStore {
    pub fn failing(ops: &[StoreOp]) -> Self {
        let store = Self::default();
        store.failing.lock().unwrap().extend(ops.iter().copied());
        store
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(&op) {
            Err(StoreError::Backend(format!("injected {:?} failure", op)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KvStore for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check(StoreOp::Get)?;
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.check(StoreOp::Set)?;
        self.inner.set_ex(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.check(StoreOp::Delete)?;
        self.inner.delete(key).await
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.check(StoreOp::SetNx)?;
        self.inner.set_nx_ex(key, value, ttl).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool, StoreError> {
        self.check(StoreOp::CompareAndDelete)?;
        self.inner.compare_and_delete(key, expected).await
    }

    async fn incr_with_expire(&self, key: &str, ttl_if_new: Duration) -> Result<i64, StoreError> {
        self.check(StoreOp::Incr)?;
        self.inner.incr_with_expire(key, ttl_if_new).await
    }
}
