//! Cache-aside client.
//!
//! Three read paths over the same store:
//!
//! - [`CacheClient::query_with_pass_through`]: caches misses as a null
//!   sentinel so repeated lookups of a missing id stop reaching the database.
//! - [`CacheClient::query_with_mutex`]: one caller per key rebuilds behind a
//!   store lock; the others wait and re-read.
//! - [`CacheClient::query_with_logical_expire`]: entries never expire in the
//!   store; stale entries are served while a background task refreshes them.
//!   [`CacheClient::warm_logical`] fills a key that was never warmed or was
//!   invalidated by a write.

use crate::envelope::LogicalEnvelope;
use crate::keys::cache_key;
use crate::lock::DistributedLock;
use crate::metrics::CacheMetrics;
use crate::rebuild::{RebuildScheduler, RebuildSchedulerConfig, RebuildTask};
use crate::sentinel::{encode_null, Cached};
use crate::store::CacheStore;
use dianping_config::{CacheConfig, ReadStrategy, RebuildConfig};
use dianping_core::{DianpingError, DianpingResult};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const PASS_THROUGH: &str = ReadStrategy::PassThrough.as_str();
const MUTEX: &str = ReadStrategy::Mutex.as_str();
const LOGICAL_EXPIRE: &str = ReadStrategy::LogicalExpire.as_str();

/// Tunables shared by all read paths.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// TTL of the null sentinel.
    pub null_ttl: Duration,
    /// Lease of a rebuild lock.
    pub lock_ttl: Duration,
    /// Pause between lock attempts.
    pub lock_retry_interval: Duration,
    /// Lock attempts before giving up.
    pub lock_max_retries: u32,
    /// Upper bound of the random extra TTL on data entries.
    pub ttl_jitter: Duration,
    /// Read through to the loader when the store fails.
    pub fallback_on_store_error: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CacheOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            null_ttl: config.null_ttl(),
            lock_ttl: config.lock_ttl(),
            lock_retry_interval: config.lock_retry_interval(),
            lock_max_retries: config.lock_max_retries,
            ttl_jitter: config.ttl_jitter(),
            fallback_on_store_error: config.fallback_on_store_error,
        }
    }
}

/// Result of a logical-expire read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// A value, possibly stale.
    Hit(T),
    /// The entity is known not to exist.
    Absent,
    /// Nothing cached; the cache was not warmed for this id.
    Unknown,
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Hit)
    }
}

/// First read of a key.
enum Probe {
    Hit(String),
    Null,
    Miss,
    /// The store failed and fallback is enabled.
    Unavailable,
}

/// Cache-aside client over a [`CacheStore`].
#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn CacheStore>,
    lock: DistributedLock,
    scheduler: Arc<RebuildScheduler>,
    options: CacheOptions,
}

impl CacheClient {
    /// Creates a client around an existing scheduler.
    pub fn new(
        store: Arc<dyn CacheStore>,
        scheduler: Arc<RebuildScheduler>,
        options: CacheOptions,
    ) -> Self {
        Self {
            lock: DistributedLock::new(store.clone()),
            store,
            scheduler,
            options,
        }
    }

    /// Creates a client and its rebuild scheduler from configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(store: Arc<dyn CacheStore>, cache: &CacheConfig, rebuild: &RebuildConfig) -> Self {
        let lock = DistributedLock::new(store.clone());
        let scheduler = Arc::new(RebuildScheduler::new(RebuildSchedulerConfig::from(rebuild), lock));
        Self::new(store, scheduler, CacheOptions::from(cache))
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// The rebuild scheduler.
    pub fn scheduler(&self) -> &Arc<RebuildScheduler> {
        &self.scheduler
    }

    /// The active options.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Writes `value` as JSON with `ttl` plus jitter.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> DianpingResult<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json, Some(self.jittered(ttl))).await
    }

    /// Writes `value` wrapped in a logical envelope that never expires in the store.
    pub async fn set_with_logical_expire<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        lease: Duration,
    ) -> DianpingResult<()> {
        let json = envelope_json(Some(value), lease)?;
        self.store.set(key, &json, None).await
    }

    /// Reads and classifies `key`.
    ///
    /// `None` means the store failed and fallback is enabled.
    pub async fn read(&self, key: &str) -> DianpingResult<Option<Cached>> {
        let raw = self.tolerate("get", key, self.store.get(key).await)?;
        Ok(raw.map(Cached::classify))
    }

    /// Writes the null sentinel under `key` for `ttl`.
    pub async fn set_null(&self, key: &str, ttl: Duration) -> DianpingResult<()> {
        self.store.set(key, encode_null(), Some(ttl)).await
    }

    /// Runs a cache write, logging the failure instead of returning it when
    /// fallback is enabled.
    pub async fn write_quietly(&self, key: &str, write: impl Future<Output = DianpingResult<()>>) -> DianpingResult<()> {
        self.tolerate("set", key, write.await).map(|_| ())
    }

    /// Deletes `key`.
    pub async fn invalidate(&self, key: &str) -> DianpingResult<bool> {
        let existed = self.store.delete(key).await?;
        debug!(key = %key, existed, "Invalidated cache entry");
        Ok(existed)
    }

    /// Reads through the cache, caching misses as the null sentinel.
    ///
    /// Concurrent misses on the same key may each call `loader`.
    pub async fn query_with_pass_through<T, ID, F, Fut>(
        &self,
        key_prefix: &str,
        id: ID,
        ttl: Duration,
        loader: F,
    ) -> DianpingResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        ID: Display,
        F: FnOnce(ID) -> Fut,
        Fut: Future<Output = DianpingResult<Option<T>>>,
    {
        let key = cache_key(key_prefix, &id);

        match self.probe(&key).await? {
            Probe::Hit(raw) => {
                if let Some(value) = decode(&key, &raw) {
                    CacheMetrics::hit(PASS_THROUGH);
                    return Ok(Some(value));
                }
            }
            Probe::Null => {
                CacheMetrics::null_hit(PASS_THROUGH);
                return Ok(None);
            }
            Probe::Miss => {}
            Probe::Unavailable => return self.load(PASS_THROUGH, loader, id).await,
        }
        CacheMetrics::miss(PASS_THROUGH);

        let loaded = self.load(PASS_THROUGH, loader, id).await?;
        self.fill(&key, loaded.as_ref(), ttl).await?;
        Ok(loaded)
    }

    /// Reads through the cache with a single-flight rebuild per key.
    ///
    /// Callers that find the lock held sleep `lock_retry_interval` and re-read,
    /// up to `lock_max_retries` attempts, then fail with
    /// [`DianpingError::LockTimeout`]. The lock is released whether or not the
    /// loader succeeds.
    pub async fn query_with_mutex<T, ID, F, Fut>(
        &self,
        key_prefix: &str,
        lock_prefix: &str,
        id: ID,
        ttl: Duration,
        loader: F,
    ) -> DianpingResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        ID: Display,
        F: FnOnce(ID) -> Fut,
        Fut: Future<Output = DianpingResult<Option<T>>>,
    {
        let key = cache_key(key_prefix, &id);
        let lock_key = cache_key(lock_prefix, &id);
        let max_attempts = self.options.lock_max_retries.max(1);

        for attempt in 1..=max_attempts {
            match self.probe(&key).await? {
                Probe::Hit(raw) => {
                    if let Some(value) = decode(&key, &raw) {
                        CacheMetrics::hit(MUTEX);
                        return Ok(Some(value));
                    }
                }
                Probe::Null => {
                    CacheMetrics::null_hit(MUTEX);
                    return Ok(None);
                }
                Probe::Miss => {}
                Probe::Unavailable => return self.load(MUTEX, loader, id).await,
            }
            if attempt == 1 {
                CacheMetrics::miss(MUTEX);
            }

            let acquired = match self.tolerate(
                "set_if_absent",
                &lock_key,
                self.lock.try_lock(&lock_key, self.options.lock_ttl).await,
            )? {
                Some(acquired) => acquired,
                None => return self.load(MUTEX, loader, id).await,
            };
            CacheMetrics::lock_attempt(acquired);

            if acquired {
                let result = self.rebuild_locked(&key, id, ttl, loader).await;
                self.lock.unlock_quietly(&lock_key).await;
                return result;
            }

            debug!(key = %key, attempt, "Rebuild lock held elsewhere; retrying");
            if attempt < max_attempts {
                tokio::time::sleep(self.options.lock_retry_interval).await;
            }
        }

        CacheMetrics::lock_timeout();
        warn!(lock_key = %lock_key, attempts = max_attempts, "Gave up waiting for rebuild lock");
        Err(DianpingError::LockTimeout {
            key: lock_key,
            attempts: max_attempts,
        })
    }

    /// Reads a logically expiring entry without ever blocking on the loader.
    ///
    /// An expired entry is returned as-is after a refresh has been handed to the
    /// rebuild scheduler. A key that was never warmed yields [`Lookup::Unknown`].
    pub async fn query_with_logical_expire<T, ID, F, Fut>(
        &self,
        key_prefix: &str,
        lock_prefix: &str,
        id: ID,
        lease: Duration,
        loader: F,
    ) -> DianpingResult<Lookup<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        ID: Display + Send + 'static,
        F: FnOnce(ID) -> Fut + Send + 'static,
        Fut: Future<Output = DianpingResult<Option<T>>> + Send + 'static,
    {
        let key = cache_key(key_prefix, &id);

        let raw = match self.probe(&key).await? {
            Probe::Hit(raw) => raw,
            Probe::Null => {
                CacheMetrics::null_hit(LOGICAL_EXPIRE);
                return Ok(Lookup::Absent);
            }
            Probe::Miss => {
                CacheMetrics::miss(LOGICAL_EXPIRE);
                debug!(key = %key, "Logical entry not warmed");
                return Ok(Lookup::Unknown);
            }
            Probe::Unavailable => return Ok(self.load(LOGICAL_EXPIRE, loader, id).await?.into()),
        };

        let Some(envelope) = decode::<LogicalEnvelope<T>>(&key, &raw) else {
            CacheMetrics::miss(LOGICAL_EXPIRE);
            return Ok(Lookup::Unknown);
        };
        if !envelope.is_expired() {
            CacheMetrics::hit(LOGICAL_EXPIRE);
            return Ok(envelope.data.into());
        }
        CacheMetrics::stale_hit();

        let lock_key = cache_key(lock_prefix, &id);
        let acquired = self
            .tolerate(
                "set_if_absent",
                &lock_key,
                self.lock.try_lock(&lock_key, self.options.lock_ttl).await,
            )?
            .unwrap_or(false);
        CacheMetrics::lock_attempt(acquired);
        if !acquired {
            return Ok(envelope.data.into());
        }

        if let Some(fresh) = self.fresh_envelope::<T>(&key).await {
            debug!(key = %key, "Entry refreshed concurrently");
            self.lock.unlock_quietly(&lock_key).await;
            return Ok(fresh.data.into());
        }

        let job = rebuild_envelope(self.store.clone(), key.clone(), id, lease, loader);
        let task = RebuildTask::new(key.clone(), job).with_lock(lock_key.clone());
        if let Err(e) = self.scheduler.submit(task) {
            warn!(key = %key, error = %e, "Rebuild rejected; releasing lock");
            self.lock.unlock_quietly(&lock_key).await;
        } else {
            debug!(key = %key, "Rebuild scheduled");
        }

        Ok(envelope.data.into())
    }

    /// Loads a logical entry that is not in the store and writes it back as
    /// an envelope with `lease`.
    ///
    /// Single-flight per key, with the same wait-and-retry bounds as
    /// [`Self::query_with_mutex`]. A missing entity is written as an empty
    /// envelope so the next reads see it as absent.
    pub async fn warm_logical<T, ID, F, Fut>(
        &self,
        key_prefix: &str,
        lock_prefix: &str,
        id: ID,
        lease: Duration,
        loader: F,
    ) -> DianpingResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        ID: Display,
        F: FnOnce(ID) -> Fut,
        Fut: Future<Output = DianpingResult<Option<T>>>,
    {
        let key = cache_key(key_prefix, &id);
        let lock_key = cache_key(lock_prefix, &id);
        let max_attempts = self.options.lock_max_retries.max(1);

        for attempt in 1..=max_attempts {
            match self.probe(&key).await? {
                Probe::Hit(raw) => {
                    if let Some(envelope) = decode::<LogicalEnvelope<T>>(&key, &raw) {
                        return Ok(envelope.data);
                    }
                }
                Probe::Null => return Ok(None),
                Probe::Miss => {}
                Probe::Unavailable => return self.load(LOGICAL_EXPIRE, loader, id).await,
            }

            let acquired = match self.tolerate(
                "set_if_absent",
                &lock_key,
                self.lock.try_lock(&lock_key, self.options.lock_ttl).await,
            )? {
                Some(acquired) => acquired,
                None => return self.load(LOGICAL_EXPIRE, loader, id).await,
            };
            CacheMetrics::lock_attempt(acquired);

            if acquired {
                let result = self.warm_locked(&key, id, lease, loader).await;
                self.lock.unlock_quietly(&lock_key).await;
                return result;
            }

            debug!(key = %key, attempt, "Warm lock held elsewhere; retrying");
            if attempt < max_attempts {
                tokio::time::sleep(self.options.lock_retry_interval).await;
            }
        }

        CacheMetrics::lock_timeout();
        warn!(lock_key = %lock_key, attempts = max_attempts, "Gave up waiting for warm lock");
        Err(DianpingError::LockTimeout {
            key: lock_key,
            attempts: max_attempts,
        })
    }

    async fn warm_locked<T, ID, F, Fut>(
        &self,
        key: &str,
        id: ID,
        lease: Duration,
        loader: F,
    ) -> DianpingResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(ID) -> Fut,
        Fut: Future<Output = DianpingResult<Option<T>>>,
    {
        if let Probe::Hit(raw) = self.probe(key).await? {
            if let Some(envelope) = decode::<LogicalEnvelope<T>>(key, &raw) {
                debug!(key = %key, "Entry warmed by previous lock holder");
                return Ok(envelope.data);
            }
        }

        let loaded = self.load(LOGICAL_EXPIRE, loader, id).await?;
        let json = envelope_json(loaded.as_ref(), lease)?;
        self.write_quietly(key, self.store.set(key, &json, None)).await?;
        debug!(key = %key, found = loaded.is_some(), "Logical entry warmed");
        Ok(loaded)
    }

    /// Second read after taking the mutex; loads and fills only on a miss.
    async fn rebuild_locked<T, ID, F, Fut>(
        &self,
        key: &str,
        id: ID,
        ttl: Duration,
        loader: F,
    ) -> DianpingResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(ID) -> Fut,
        Fut: Future<Output = DianpingResult<Option<T>>>,
    {
        match self.probe(key).await? {
            Probe::Hit(raw) => {
                if let Some(value) = decode(key, &raw) {
                    debug!(key = %key, "Entry filled by previous lock holder");
                    return Ok(Some(value));
                }
            }
            Probe::Null => return Ok(None),
            Probe::Miss | Probe::Unavailable => {}
        }

        let loaded = self.load(MUTEX, loader, id).await?;
        self.fill(key, loaded.as_ref(), ttl).await?;
        Ok(loaded)
    }

    async fn fresh_envelope<T: DeserializeOwned>(&self, key: &str) -> Option<LogicalEnvelope<T>> {
        let raw = self.store.get(key).await.ok()??;
        decode::<LogicalEnvelope<T>>(key, &raw).filter(|envelope| !envelope.is_expired())
    }

    async fn probe(&self, key: &str) -> DianpingResult<Probe> {
        let raw = match self.tolerate("get", key, self.store.get(key).await)? {
            Some(raw) => raw,
            None => return Ok(Probe::Unavailable),
        };
        Ok(match Cached::classify(raw) {
            Cached::Missing => Probe::Miss,
            Cached::Null => Probe::Null,
            Cached::Value(raw) => Probe::Hit(raw),
        })
    }

    async fn load<T, ID, F, Fut>(&self, strategy: &'static str, loader: F, id: ID) -> DianpingResult<Option<T>>
    where
        F: FnOnce(ID) -> Fut,
        Fut: Future<Output = DianpingResult<Option<T>>>,
    {
        let started = Instant::now();
        let loaded = loader(id).await;
        CacheMetrics::loader_call(strategy, started.elapsed());
        loaded
    }

    /// Caches a loaded value, or the null sentinel when it is absent.
    async fn fill<T: Serialize>(&self, key: &str, value: Option<&T>, ttl: Duration) -> DianpingResult<()> {
        match value {
            Some(value) => self.write_quietly(key, self.set(key, value, ttl)).await,
            None => {
                debug!(key = %key, "Caching null sentinel");
                self.write_quietly(key, self.set_null(key, self.options.null_ttl))
                    .await
            }
        }
    }

    /// Absorbs a store failure when fallback is enabled.
    ///
    /// `Ok(None)` means the operation failed and the caller should carry on
    /// without the cache.
    fn tolerate<R>(&self, operation: &'static str, key: &str, result: DianpingResult<R>) -> DianpingResult<Option<R>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_cache_failure() => {
                CacheMetrics::store_error(operation);
                if self.options.fallback_on_store_error {
                    warn!(
                        backend = self.store.backend(),
                        operation,
                        key = %key,
                        error = %e,
                        "Cache store unavailable; continuing without cache"
                    );
                    Ok(None)
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }

    fn jittered(&self, ttl: Duration) -> Duration {
        let bound = u64::try_from(self.options.ttl_jitter.as_millis()).unwrap_or(u64::MAX);
        if bound == 0 {
            return ttl;
        }
        ttl.saturating_add(Duration::from_millis(rand::thread_rng().gen_range(0..=bound)))
    }
}

/// Parses a cached payload, treating garbage as a miss.
fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Discarding unreadable cache entry");
            None
        }
    }
}

fn envelope_json<T: Serialize>(data: Option<&T>, lease: Duration) -> DianpingResult<String> {
    Ok(serde_json::to_string(&LogicalEnvelope::new(data, lease))?)
}

/// Background job: reload the entity and write a fresh envelope.
async fn rebuild_envelope<T, ID, F, Fut>(
    store: Arc<dyn CacheStore>,
    key: String,
    id: ID,
    lease: Duration,
    loader: F,
) -> DianpingResult<()>
where
    T: Serialize,
    F: FnOnce(ID) -> Fut,
    Fut: Future<Output = DianpingResult<Option<T>>>,
{
    let started = Instant::now();
    let loaded = loader(id).await?;
    CacheMetrics::loader_call(LOGICAL_EXPIRE, started.elapsed());
    if loaded.is_none() {
        debug!(key = %key, "Entity vanished; caching empty envelope");
    }
    let json = envelope_json(loaded.as_ref(), lease)?;
    store.set(&key, &json, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCacheStore;

    fn client(options: CacheOptions) -> (Arc<MemoryCacheStore>, CacheClient) {
        let store = Arc::new(MemoryCacheStore::new());
        let scheduler = Arc::new(RebuildScheduler::new(
            RebuildSchedulerConfig::default(),
            DistributedLock::new(store.clone()),
        ));
        (store.clone(), CacheClient::new(store, scheduler, options))
    }

    #[tokio::test]
    async fn test_jitter_bounds() {
        let (_, client) = client(CacheOptions {
            ttl_jitter: Duration::from_secs(5),
            ..CacheOptions::default()
        });
        for _ in 0..50 {
            let ttl = client.jittered(Duration::from_secs(60));
            assert!(ttl >= Duration::from_secs(60));
            assert!(ttl <= Duration::from_secs(65));
        }
    }

    #[tokio::test]
    async fn test_zero_jitter_keeps_ttl() {
        let (_, client) = client(CacheOptions {
            ttl_jitter: Duration::ZERO,
            ..CacheOptions::default()
        });
        assert_eq!(client.jittered(Duration::from_secs(60)), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_set_with_logical_expire_has_no_store_ttl() {
        let (store, client) = client(CacheOptions::default());
        client
            .set_with_logical_expire("shop:cache:1", &"value", Duration::from_secs(20))
            .await
            .unwrap();
        assert_eq!(store.ttl("shop:cache:1").await.unwrap(), None);

        let raw = store.get("shop:cache:1").await.unwrap().unwrap();
        let envelope: LogicalEnvelope<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope.data.as_deref(), Some("value"));
        assert!(!envelope.is_expired());
    }

    #[tokio::test]
    async fn test_garbage_entry_is_reloaded() {
        let (store, client) = client(CacheOptions::default());
        store.set("shop:cache:5", "{not json", None).await.unwrap();

        let value: Option<i64> = client
            .query_with_pass_through("shop:cache:", 5_i64, Duration::from_secs(60), |id| async move {
                Ok(Some(id * 10))
            })
            .await
            .unwrap();
        assert_eq!(value, Some(50));
        assert_eq!(store.get("shop:cache:5").await.unwrap().as_deref(), Some("50"));
    }

    #[test]
    fn test_lookup_conversions() {
        assert_eq!(Lookup::from(Some(1)), Lookup::Hit(1));
        assert_eq!(Lookup::<i32>::from(None), Lookup::Absent);
    }
}
