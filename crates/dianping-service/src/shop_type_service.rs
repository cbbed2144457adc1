//! Shop type service trait definition.

use async_trait::async_trait;
use dianping_core::{DianpingResult, ShopType};

/// Shop type service trait.
#[async_trait]
pub trait ShopTypeService: Send + Sync {
    /// Lists every shop type ordered by `sort`.
    ///
    /// Fails with a business-rule error when no shop types exist.
    async fn query_type_list(&self) -> DianpingResult<Vec<ShopType>>;
}
