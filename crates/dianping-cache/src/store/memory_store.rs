//! Process-local cache store.
//!
//! Used when Redis is disabled and throughout the test suites. Every
//! operation takes the map lock once, so set-if-absent and compare-and-delete
//! are atomic exactly like their Redis counterparts.

use super::CacheStore;
use async_trait::async_trait;
use dianping_core::{DianpingResult, HealthCheck, HealthStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, ttl: Option<Duration>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-memory cache store with lazy expiry.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    /// Returns true if no live entry exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Runs `f` against the live entry under `key`, evicting it if it expired.
    fn with_live<R>(&self, key: &str, f: impl FnOnce(Option<&mut Entry>) -> R) -> R {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        f(entries.get_mut(key))
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> DianpingResult<Option<String>> {
        Ok(self.with_live(key, |entry| entry.map(|e| e.value.clone())))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> DianpingResult<()> {
        self.entries.lock().insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> DianpingResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(value, Some(ttl)));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> DianpingResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .remove(key)
            .is_some_and(|e| e.is_live(now)))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> DianpingResult<bool> {
        Ok(self.with_live(key, |entry| match entry {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                true
            }
            None => false,
        }))
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> DianpingResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) && entry.value == expected => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> DianpingResult<Option<Duration>> {
        Ok(self.with_live(key, |entry| {
            entry
                .and_then(|e| e.expires_at)
                .map(|at| at.saturating_duration_since(Instant::now()))
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl HealthCheck for MemoryCacheStore {
    fn name(&self) -> &str {
        "memory-cache"
    }

    async fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryCacheStore::new();
        store.set("shop:cache:1", "{}", None).await.unwrap();
        assert_eq!(store.get("shop:cache:1").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(store.get("shop:cache:2").await.unwrap(), None);
        assert_eq!(store.ttl("shop:cache:1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryCacheStore::new();
        store
            .set("k", "v", Some(Duration::from_secs(2)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.ttl("k").await.unwrap(), Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_set_if_absent_does_not_overwrite() {
        let store = MemoryCacheStore::new();
        let ttl = Duration::from_secs(10);
        assert!(store.set_if_absent("shop:lock:14", "1", ttl).await.unwrap());
        assert!(!store.set_if_absent("shop:lock:14", "2", ttl).await.unwrap());
        assert_eq!(store.get("shop:lock:14").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_if_absent_after_expiry() {
        let store = MemoryCacheStore::new();
        assert!(store
            .set_if_absent("lock", "a", Duration::from_millis(100))
            .await
            .unwrap());
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(store
            .set_if_absent("lock", "b", Duration::from_millis(100))
            .await
            .unwrap());
        assert_eq!(store.get("lock").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_delete_and_expire() {
        let store = MemoryCacheStore::new();
        store.set("k", "v", None).await.unwrap();
        assert!(store.expire("k", Duration::from_secs(30)).await.unwrap());
        assert!(store.ttl("k").await.unwrap().is_some());
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert!(!store.expire("k", Duration::from_secs(30)).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_if_equals() {
        let store = MemoryCacheStore::new();
        store.set("lock", "owner-a", None).await.unwrap();
        assert!(!store.delete_if_equals("lock", "owner-b").await.unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.delete_if_equals("lock", "owner-a").await.unwrap());
        assert!(store.is_empty());
    }
}
