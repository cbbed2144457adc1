//! Shared fixtures for cache integration tests.

use async_trait::async_trait;
use dianping_cache::{
    CacheClient, CacheOptions, CacheStore, DistributedLock, MemoryCacheStore, RebuildScheduler,
    RebuildSchedulerConfig,
};
use dianping_core::{DianpingError, DianpingResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Minimal cached record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
}

impl Item {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Counting in-memory stand-in for the database.
pub struct FakeDb {
    rows: parking_lot::RwLock<HashMap<i64, Item>>,
    reads: AtomicUsize,
    delay: Duration,
}

impl FakeDb {
    pub fn with_rows(rows: impl IntoIterator<Item = Item>) -> Arc<Self> {
        Self::with_delay(rows, Duration::ZERO)
    }

    pub fn with_delay(rows: impl IntoIterator<Item = Item>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            rows: parking_lot::RwLock::new(rows.into_iter().map(|item| (item.id, item)).collect()),
            reads: AtomicUsize::new(0),
            delay,
        })
    }

    pub async fn find(&self, id: i64) -> DianpingResult<Option<Item>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.rows.read().get(&id).cloned())
    }

    pub fn put(&self, item: Item) {
        self.rows.write().insert(item.id, item);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

/// Loader for paths that must be served from the cache.
pub async fn never_called(id: i64) -> DianpingResult<Option<Item>> {
    panic!("loader called for id {id}")
}

/// Store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    async fn get(&self, _key: &str) -> DianpingResult<Option<String>> {
        Err(DianpingError::cache("connection refused"))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> DianpingResult<()> {
        Err(DianpingError::cache("connection refused"))
    }

    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> DianpingResult<bool> {
        Err(DianpingError::cache("connection refused"))
    }

    async fn delete(&self, _key: &str) -> DianpingResult<bool> {
        Err(DianpingError::cache("connection refused"))
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> DianpingResult<bool> {
        Err(DianpingError::cache("connection refused"))
    }

    async fn delete_if_equals(&self, _key: &str, _expected: &str) -> DianpingResult<bool> {
        Err(DianpingError::cache("connection refused"))
    }

    async fn ttl(&self, _key: &str) -> DianpingResult<Option<Duration>> {
        Err(DianpingError::cache("connection refused"))
    }

    fn backend(&self) -> &'static str {
        "broken"
    }
}

/// Builds a client over `store` with default rebuild settings.
pub fn client_over(store: Arc<dyn CacheStore>, options: CacheOptions) -> CacheClient {
    let scheduler = Arc::new(RebuildScheduler::new(
        RebuildSchedulerConfig::default(),
        DistributedLock::new(store.clone()),
    ));
    CacheClient::new(store, scheduler, options)
}

/// Builds a client over a fresh memory store.
pub fn memory_client(options: CacheOptions) -> (Arc<MemoryCacheStore>, CacheClient) {
    let store = Arc::new(MemoryCacheStore::new());
    (store.clone(), client_over(store, options))
}
