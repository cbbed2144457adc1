//! Shop type controller.

use crate::{
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{extract::State, routing::get, Router};
use dianping_core::ShopType;

/// Creates the shop type router.
pub fn router() -> Router<AppState> {
    Router::new().route("/list", get(list_shop_types))
}

/// List every shop type ordered by `sort`.
async fn list_shop_types(State(state): State<AppState>) -> ApiResult<Vec<ShopType>> {
    let types = state.shop_type_service.query_type_list().await?;
    ok(types)
}
