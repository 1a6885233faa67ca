//! Cache access layer.
//!
//! Typed JSON get/set over a [`KeyValueStore`], plus the direct key
//! management operations exposed under `/api/cache`.

pub mod redis_store;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use redis_store::RedisStore;

/// Store TTL sentinel for a key that does not exist.
pub const TTL_KEY_MISSING: i64 = -2;
/// Store TTL sentinel for a key that exists without an expiry.
pub const TTL_NO_EXPIRY: i64 = -1;

pub const WEATHER_NAMESPACE_PATTERN: &str = "weather:*";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Store error: {0}")]
    Store(String),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Store(err.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Wire contract of the networked key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: String, seconds: u64) -> CacheResult<()>;

    /// Returns the number of keys removed.
    async fn del(&self, key: &str) -> CacheResult<i64>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Remaining seconds, or [`TTL_KEY_MISSING`] / [`TTL_NO_EXPIRY`].
    async fn ttl(&self, key: &str) -> CacheResult<i64>;

    /// Returns true iff an expiry was set, false when the key is absent.
    async fn expire(&self, key: &str, seconds: i64) -> CacheResult<bool>;

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_keys: usize,
    pub weather_keys: usize,
    pub all_keys_count: usize,
}

#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn KeyValueStore>,
    default_ttl: u64,
}

impl CacheService {
    pub fn new(store: Arc<dyn KeyValueStore>, default_ttl: u64) -> Self {
        Self { store, default_ttl }
    }

    /// Reads and decodes an entry. A payload that does not decode as `T` is
    /// treated as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring malformed cache payload");
                Ok(None)
            }
        }
    }

    /// Stores `value` as JSON, expiring after `ttl` seconds or the default TTL.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> CacheResult<()> {
        let json = serde_json::to_string(value)?;
        self.store
            .set_ex(key, json, ttl.unwrap_or(self.default_ttl))
            .await
    }

    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.store.exists(key).await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.store.del(key).await? > 0)
    }

    pub async fn get_ttl(&self, key: &str) -> CacheResult<i64> {
        self.store.ttl(key).await
    }

    /// Sets a new expiry. Returns false when the key does not exist, so callers
    /// that need a 404 must check [`CacheService::exists`] first. HTTP callers
    /// pass a TTL already bounded by [`crate::utils::parse_ttl`].
    pub async fn update_ttl(&self, key: &str, ttl: u64) -> CacheResult<bool> {
        let seconds = i64::try_from(ttl)
            .map_err(|_| CacheError::Store(format!("TTL {ttl} out of range")))?;
        self.store.expire(key, seconds).await
    }

    pub async fn search_keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut keys = self.store.keys(pattern).await?;
        keys.sort();
        Ok(keys)
    }

    /// Two separate scans; counts may be slightly stale relative to each other.
    pub async fn stats(&self) -> CacheResult<CacheStats> {
        let all = self.store.keys("*").await?;
        let weather = self.store.keys(WEATHER_NAMESPACE_PATTERN).await?;

        Ok(CacheStats {
            total_keys: all.len(),
            weather_keys: weather.len(),
            all_keys_count: all.len(),
        })
    }
}

/// Drops `store` if this is its last handle, closing the underlying
/// connection. Returns false while other handles are still alive.
pub fn release<S: KeyValueStore>(store: Arc<S>) -> bool {
    Arc::try_unwrap(store).map(drop).is_ok()
}
