//! Shop type service implementation.

use crate::shop_type_service::ShopTypeService;
use async_trait::async_trait;
use dianping_cache::keys::CACHE_SHOP_TYPE_KEY;
use dianping_cache::{CacheClient, Cached};
use dianping_core::{DianpingError, DianpingResult, ShopType};
use dianping_repository::ShopTypeRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const EMPTY_MESSAGE: &str = "no shop types";

/// Shop type service caching the whole ordered list under one key.
pub struct ShopTypeServiceImpl {
    repository: Arc<dyn ShopTypeRepository>,
    cache: CacheClient,
    ttl: Duration,
}

impl ShopTypeServiceImpl {
    /// Creates a new shop type service.
    pub fn new(repository: Arc<dyn ShopTypeRepository>, cache: CacheClient, ttl: Duration) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }
}

#[async_trait]
impl ShopTypeService for ShopTypeServiceImpl {
    async fn query_type_list(&self) -> DianpingResult<Vec<ShopType>> {
        let key = CACHE_SHOP_TYPE_KEY;

        match self.cache.read(key).await? {
            Some(Cached::Value(raw)) => match serde_json::from_str::<Vec<ShopType>>(&raw) {
                Ok(types) => {
                    debug!(key, count = types.len(), "Shop type list served from cache");
                    return Ok(types);
                }
                Err(e) => warn!(key, error = %e, "Unreadable shop type list; reloading"),
            },
            Some(Cached::Null) => return Err(DianpingError::business_rule(EMPTY_MESSAGE)),
            Some(Cached::Missing) | None => {}
        }

        let types = self.repository.find_all_ordered().await?;
        if types.is_empty() {
            self.cache
                .write_quietly(key, self.cache.set_null(key, self.ttl))
                .await?;
            return Err(DianpingError::business_rule(EMPTY_MESSAGE));
        }

        self.cache
            .write_quietly(key, self.cache.set(key, &types, self.ttl))
            .await?;
        debug!(key, count = types.len(), "Shop type list cached");
        Ok(types)
    }
}
