//! In-process [`KeyValueStore`] used by tests. Mirrors Redis TTL sentinels and
//! `KEYS` glob matching for `*` and `?`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{CacheResult, KeyValueStore, TTL_KEY_MISSING, TTL_NO_EXPIRY};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw payload, bypassing JSON encoding.
    pub async fn insert_raw(&self, key: &str, value: &str, ttl_secs: Option<u64>) {
        let expires_at = ttl_secs.map(|s| Instant::now() + Duration::from_secs(s));
        self.entries.write().await.insert(
            key.to_string(),
            Entry { value: value.to_string(), expires_at },
        );
    }

    pub async fn raw(&self, key: &str) -> Option<String> {
        self.get(key).await.ok().flatten()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: String, seconds: u64) -> CacheResult<()> {
        let expires_at = Some(Instant::now() + Duration::from_secs(seconds));
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<i64> {
        let now = Instant::now();
        let removed = self.entries.write().await.remove(key);
        Ok(i64::from(removed.is_some_and(|e| e.is_live(now))))
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn ttl(&self, key: &str) -> CacheResult<i64> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(match entries.get(key).filter(|e| e.is_live(now)) {
            None => TTL_KEY_MISSING,
            Some(Entry { expires_at: None, .. }) => TTL_NO_EXPIRY,
            Some(Entry { expires_at: Some(at), .. }) => {
                // Redis rounds to the nearest second
                let millis = at.duration_since(now).as_millis();
                ((millis + 500) / 1000) as i64
            }
        })
    }

    async fn expire(&self, key: &str, seconds: i64) -> CacheResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(key).filter(|e| e.is_live(now)) else {
            return Ok(false);
        };
        if seconds <= 0 {
            entries.remove(key);
        } else {
            entry.expires_at = Some(now + Duration::from_secs(seconds as u64));
        }
        Ok(true)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let now = Instant::now();
        let pattern: Vec<char> = pattern.chars().collect();
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .filter(|(k, _)| glob_match(&pattern, &k.chars().collect::<Vec<_>>()))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|i| glob_match(rest, &text[i..])),
        Some(('?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, text: &str) -> bool {
        glob_match(
            &pattern.chars().collect::<Vec<_>>(),
            &text.chars().collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_glob_match() {
        assert!(matches("*", ""));
        assert!(matches("*", "weather:paris"));
        assert!(matches("weather:*", "weather:timeline:paris:forecast:"));
        assert!(!matches("weather:*", "session:weather:1"));
        assert!(matches("weather:?aris", "weather:paris"));
        assert!(!matches("weather:?", "weather:"));
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible() {
        let store = MemoryStore::new();
        store.insert_raw("gone", "1", Some(0)).await;

        assert_eq!(store.get("gone").await.unwrap(), None);
        assert_eq!(store.ttl("gone").await.unwrap(), TTL_KEY_MISSING);
        assert_eq!(store.del("gone").await.unwrap(), 0);
        assert!(store.keys("*").await.unwrap().is_empty());
    }
}
