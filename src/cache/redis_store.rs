//! Redis Store Module
//!
//! `KvStore` backend over a multiplexed, auto-reconnecting Redis connection.
//! Compare-and-delete and increment-and-expire run as Lua scripts so each is a
//! single atomic step on the server.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::info;

use crate::cache::KvStore;
use crate::error::StoreError;

const COMPARE_AND_DELETE: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  return redis.call('DEL', KEYS[1])
else
  return 0
end";

const INCR_WITH_EXPIRE: &str = r"
local c = redis.call('INCR', KEYS[1])
if c == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return c";

// == Redis Store ==
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    compare_and_delete: Script,
    incr_with_expire: Script,
}

impl RedisStore {
    /// Opens a connection manager against `url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to Redis at {}", url);

        Ok(Self {
            conn,
            compare_and_delete: Script::new(COMPARE_AND_DELETE),
            incr_with_expire: Script::new(INCR_WITH_EXPIRE),
        })
    }
}

/// Redis expiries are whole milliseconds and must be positive.
fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        // SET .. NX replies OK on success and nil when the key exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = self
            .compare_and_delete
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await?;
        Ok(removed == 1)
    }

    async fn incr_with_expire(&self, key: &str, ttl_if_new: Duration) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        let count: i64 = self
            .incr_with_expire
            .key(key)
            .arg(ttl_millis(ttl_if_new))
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_is_positive() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_secs(2)), 2000);
    }

    async fn connect_from_env() -> RedisStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
        RedisStore::connect(&url).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn test_lock_primitives_against_redis() {
        let store = connect_from_env().await;
        let key = format!("test:lock:{}", uuid::Uuid::new_v4());
        let ttl = Duration::from_secs(2);

        assert!(store.set_nx_ex(&key, b"a", ttl).await.unwrap());
        assert!(!store.set_nx_ex(&key, b"b", ttl).await.unwrap());
        assert!(!store.compare_and_delete(&key, b"b").await.unwrap());
        assert!(store.compare_and_delete(&key, b"a").await.unwrap());
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn test_counter_against_redis() {
        let store = connect_from_env().await;
        let key = format!("test:rl:{}", uuid::Uuid::new_v4());
        let window = Duration::from_secs(10);

        assert_eq!(store.incr_with_expire(&key, window).await.unwrap(), 1);
        assert_eq!(store.incr_with_expire(&key, window).await.unwrap(), 2);
        assert!(store.delete(&key).await.unwrap());
    }
}
