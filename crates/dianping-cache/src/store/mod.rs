//! Key-value store abstraction the cache layer runs on.
//!
//! The cache-aside protocol only needs string values with optional expiry,
//! an atomic set-if-absent for locking, and a compare-and-delete for owned
//! locks. Both implementations provide those atomically.

mod memory_store;
mod redis_store;

pub use memory_store::MemoryCacheStore;
pub use redis_store::{create_pool, RedisCacheStore};

use async_trait::async_trait;
use dianping_core::DianpingResult;
use std::time::Duration;

/// String key-value store with expiry.
///
/// Errors are reported as `DianpingError::Cache` so callers can tell a store
/// outage apart from a failure of the authoritative store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the raw value under `key`, or `None` if the key is absent or expired.
    async fn get(&self, key: &str) -> DianpingResult<Option<String>>;

    /// Writes `value` under `key`. `None` keeps the entry until it is deleted.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> DianpingResult<()>;

    /// Atomically writes `value` with `ttl` only if `key` does not exist.
    ///
    /// Returns `true` when the write happened. A `false` result leaves the
    /// store untouched.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> DianpingResult<bool>;

    /// Deletes `key`. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> DianpingResult<bool>;

    /// Resets the expiry of an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> DianpingResult<bool>;

    /// Atomically deletes `key` only if it currently holds `expected`.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> DianpingResult<bool>;

    /// Remaining time to live. `None` if the key is absent or never expires.
    async fn ttl(&self, key: &str) -> DianpingResult<Option<Duration>>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
