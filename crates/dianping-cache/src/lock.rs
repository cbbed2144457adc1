//! Distributed mutex over the cache store.
//!
//! A lock is a key written with set-if-absent and a lease. Two flavours:
//!
//! - [`DistributedLock::try_lock`] / [`DistributedLock::unlock`] store a fixed
//!   value and release by plain delete. If the lease lapses while the holder is
//!   still working, another caller may acquire the lock and the first holder's
//!   unlock will then delete it.
//! - [`DistributedLock::try_lock_owned`] stores a random owner token and
//!   releases only if the token still matches.

use crate::store::CacheStore;
use dianping_core::DianpingResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Value stored under unowned lock keys.
const LOCK_VALUE: &str = "1";

/// Handle for an owned lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    key: String,
    owner: String,
}

impl LockToken {
    /// The lock key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owner token stored under the key.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// Non-blocking distributed lock.
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn CacheStore>,
}

impl DistributedLock {
    /// Creates a lock helper over `store`.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Attempts to take `lock_key` for `lease`. Never blocks.
    ///
    /// Returns `false` if the key is held; the store is left untouched.
    pub async fn try_lock(&self, lock_key: &str, lease: Duration) -> DianpingResult<bool> {
        let acquired = self.store.set_if_absent(lock_key, LOCK_VALUE, lease).await?;
        debug!(lock_key = %lock_key, acquired, "try_lock");
        Ok(acquired)
    }

    /// Releases `lock_key` unconditionally.
    pub async fn unlock(&self, lock_key: &str) -> DianpingResult<()> {
        self.store.delete(lock_key).await?;
        debug!(lock_key = %lock_key, "unlock");
        Ok(())
    }

    /// Releases `lock_key`, logging instead of failing.
    pub async fn unlock_quietly(&self, lock_key: &str) {
        if let Err(e) = self.unlock(lock_key).await {
            warn!(lock_key = %lock_key, error = %e, "Failed to release lock; it will lapse with its lease");
        }
    }

    /// Attempts to take `lock_key` with a unique owner token.
    pub async fn try_lock_owned(
        &self,
        lock_key: &str,
        lease: Duration,
    ) -> DianpingResult<Option<LockToken>> {
        let owner = Uuid::new_v4().to_string();
        if self.store.set_if_absent(lock_key, &owner, lease).await? {
            Ok(Some(LockToken {
                key: lock_key.to_string(),
                owner,
            }))
        } else {
            Ok(None)
        }
    }

    /// Releases an owned lock if the token still matches.
    ///
    /// Returns `false` when the lease lapsed and someone else now holds the key.
    pub async fn unlock_owned(&self, token: &LockToken) -> DianpingResult<bool> {
        let released = self.store.delete_if_equals(&token.key, &token.owner).await?;
        if !released {
            warn!(lock_key = %token.key, "Owned lock was no longer held at release");
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCacheStore;

    fn lock() -> (Arc<MemoryCacheStore>, DistributedLock) {
        let store = Arc::new(MemoryCacheStore::new());
        (store.clone(), DistributedLock::new(store))
    }

    #[tokio::test]
    async fn test_second_try_lock_fails() {
        let (store, lock) = lock();
        let lease = Duration::from_secs(10);

        assert!(lock.try_lock("shop:lock:14", lease).await.unwrap());
        let ttl_before = store.ttl("shop:lock:14").await.unwrap();
        assert!(!lock.try_lock("shop:lock:14", lease).await.unwrap());
        assert_eq!(store.get("shop:lock:14").await.unwrap().as_deref(), Some("1"));
        assert!(store.ttl("shop:lock:14").await.unwrap() <= ttl_before);
    }

    #[tokio::test]
    async fn test_unlock_allows_reacquire() {
        let (_, lock) = lock();
        let lease = Duration::from_secs(10);

        assert!(lock.try_lock("k", lease).await.unwrap());
        lock.unlock("k").await.unwrap();
        assert!(lock.try_lock("k", lease).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lease_lapses() {
        let (_, lock) = lock();
        assert!(lock.try_lock("k", Duration::from_secs(1)).await.unwrap());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(lock.try_lock("k", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_owned_unlock_spares_new_holder() {
        let (store, lock) = lock();
        let first = lock
            .try_lock_owned("k", Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        let second = lock
            .try_lock_owned("k", Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first.owner(), second.owner());

        assert!(!lock.unlock_owned(&first).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(second.owner()));
        assert!(lock.unlock_owned(&second).await.unwrap());
        assert!(store.is_empty());
    }
}
