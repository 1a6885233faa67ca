//! Redis-backed [`KeyValueStore`].

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use super::{CacheResult, KeyValueStore};

/// Single shared connection, cloned per command. The manager reconnects on
/// its own when the link drops.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Redis connected");

        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set_ex(&self, key: &str, value: String, seconds: u64) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.del(key).await?)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    async fn ttl(&self, key: &str) -> CacheResult<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.ttl(key).await?)
    }

    async fn expire(&self, key: &str, seconds: i64) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.expire(key, seconds).await?)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.keys(pattern).await?)
    }
}
