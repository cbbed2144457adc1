//! Repository traits defining the data access interface.

use async_trait::async_trait;
use dianping_core::{DianpingResult, Shop, ShopId, ShopType};

/// Shop repository trait.
#[async_trait]
pub trait ShopRepository: Send + Sync {
    /// Finds a shop by ID.
    async fn find_by_id(&self, id: ShopId) -> DianpingResult<Option<Shop>>;

    /// Overwrites the stored shop with the same ID.
    ///
    /// Returns `false` if no row matched.
    async fn update(&self, shop: &Shop) -> DianpingResult<bool>;
}

/// Shop type repository trait.
#[async_trait]
pub trait ShopTypeRepository: Send + Sync {
    /// Returns every shop type ordered by `sort` ascending.
    async fn find_all_ordered(&self) -> DianpingResult<Vec<ShopType>>;
}
