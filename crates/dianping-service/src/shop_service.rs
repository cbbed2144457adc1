//! Shop service trait definition.

use crate::dto::UpdateShopRequest;
use async_trait::async_trait;
use dianping_config::ReadStrategy;
use dianping_core::{DianpingResult, Shop, ShopId};
use std::time::Duration;

/// Shop service trait.
#[async_trait]
pub trait ShopService: Send + Sync {
    /// Gets a shop through the configured read strategy.
    async fn query_by_id(&self, id: ShopId) -> DianpingResult<Shop>;

    /// Gets a shop through an explicit read strategy.
    async fn query_with(&self, id: ShopId, strategy: ReadStrategy) -> DianpingResult<Shop>;

    /// Updates a shop in the database, then drops its cache entry.
    async fn update(&self, request: UpdateShopRequest) -> DianpingResult<()>;

    /// Loads a shop and stores it with a logical deadline `lease` from now.
    async fn warm_up(&self, id: ShopId, lease: Duration) -> DianpingResult<()>;
}
