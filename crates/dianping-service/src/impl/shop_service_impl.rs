//! Shop service implementation.

use crate::dto::UpdateShopRequest;
use crate::shop_service::ShopService;
use async_trait::async_trait;
use dianping_cache::keys::{shop_key, CACHE_SHOP_KEY, LOCK_SHOP_KEY};
use dianping_cache::{CacheClient, Lookup};
use dianping_config::{CacheConfig, ReadStrategy};
use dianping_core::{DianpingError, DianpingResult, Shop, ShopId, ValidateExt};
use dianping_repository::ShopRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Cache settings that apply to shop lookups.
#[derive(Debug, Clone, Copy)]
pub struct ShopCacheSettings {
    pub strategy: ReadStrategy,
    pub ttl: Duration,
}

impl From<&CacheConfig> for ShopCacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            strategy: config.strategy,
            ttl: config.shop_ttl(),
        }
    }
}

/// Shop service backed by a repository and the cache-aside client.
pub struct ShopServiceImpl {
    repository: Arc<dyn ShopRepository>,
    cache: CacheClient,
    settings: ShopCacheSettings,
    lease: Duration,
}

impl ShopServiceImpl {
    /// Creates a new shop service.
    pub fn new(
        repository: Arc<dyn ShopRepository>,
        cache: CacheClient,
        settings: ShopCacheSettings,
        lease: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            settings,
            lease,
        }
    }

    /// Creates a shop service from the cache configuration section.
    pub fn from_config(repository: Arc<dyn ShopRepository>, cache: CacheClient, config: &CacheConfig) -> Self {
        Self::new(repository, cache, ShopCacheSettings::from(config), config.logical_lease())
    }
}

#[async_trait]
impl ShopService for ShopServiceImpl {
    async fn query_by_id(&self, id: ShopId) -> DianpingResult<Shop> {
        self.query_with(id, self.settings.strategy).await
    }

    #[instrument(skip(self), fields(shop_id = %id))]
    async fn query_with(&self, id: ShopId, strategy: ReadStrategy) -> DianpingResult<Shop> {
        let repository = self.repository.clone();
        let loader = move |id: ShopId| async move { repository.find_by_id(id).await };
        let ttl = self.settings.ttl;

        let shop = match strategy {
            ReadStrategy::PassThrough => {
                self.cache
                    .query_with_pass_through(CACHE_SHOP_KEY, id, ttl, loader)
                    .await?
            }
            ReadStrategy::Mutex => {
                self.cache
                    .query_with_mutex(CACHE_SHOP_KEY, LOCK_SHOP_KEY, id, ttl, loader)
                    .await?
            }
            ReadStrategy::LogicalExpire => {
                let lookup = self
                    .cache
                    .query_with_logical_expire(CACHE_SHOP_KEY, LOCK_SHOP_KEY, id, self.lease, loader)
                    .await?;
                match lookup {
                    Lookup::Hit(shop) => Some(shop),
                    Lookup::Absent => None,
                    // Never warmed, or dropped by an update.
                    Lookup::Unknown => {
                        let repository = self.repository.clone();
                        self.cache
                            .warm_logical(CACHE_SHOP_KEY, LOCK_SHOP_KEY, id, self.lease, move |id| async move {
                                repository.find_by_id(id).await
                            })
                            .await?
                    }
                }
            }
        };

        shop.ok_or_else(|| DianpingError::not_found("Shop", id))
    }

    async fn update(&self, request: UpdateShopRequest) -> DianpingResult<()> {
        let id = request
            .id
            .map(ShopId::new)
            .ok_or_else(|| DianpingError::validation("shop id cannot be empty"))?;
        request.validate_request()?;
        debug!(shop_id = %id, "Updating shop");

        let mut shop = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DianpingError::not_found("Shop", id))?;
        request.apply_to(&mut shop);

        if !self.repository.update(&shop).await? {
            return Err(DianpingError::not_found("Shop", id));
        }

        // Database first, then drop the cached copy.
        self.cache.invalidate(&shop_key(id)).await?;

        info!(shop_id = %id, "Shop updated");
        Ok(())
    }

    async fn warm_up(&self, id: ShopId, lease: Duration) -> DianpingResult<()> {
        let shop = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DianpingError::not_found("Shop", id))?;

        self.cache
            .set_with_logical_expire(&shop_key(id), &shop, lease)
            .await?;

        info!(shop_id = %id, lease_secs = lease.as_secs(), "Shop cache warmed");
        Ok(())
    }
}
