//! Shop controller.

use crate::{
    extractors::{ApiJson, CurrentUser, Session},
    responses::{ok, ok_empty, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Router,
};
use dianping_core::{DianpingError, Shop, ShopId};
use dianping_service::UpdateShopRequest;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Query parameters of the warm-up endpoint.
#[derive(Debug, Deserialize)]
pub struct WarmUpQuery {
    pub lease_secs: Option<u64>,
}

/// Creates the shop router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", put(update_shop))
        .route("/:id", get(get_shop))
        .route("/:id/warm-up", post(warm_up_shop))
}

/// Get a shop by ID through the cache.
async fn get_shop(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Shop> {
    let shop_id = parse_shop_id(&id)?;
    debug!(shop_id = %shop_id, user_id = ?session.user.as_ref().map(|u| u.id), "Get shop request");

    let shop = state.shop_service.query_by_id(shop_id).await?;
    ok(shop)
}

/// Update a shop and invalidate its cache entry.
async fn update_shop(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(request): ApiJson<UpdateShopRequest>,
) -> ApiResult<()> {
    debug!(shop_id = ?request.id, user_id = %user.id, "Update shop request");

    state.shop_service.update(request).await?;
    ok_empty()
}

/// Pre-load a shop into the logically expiring cache.
async fn warm_up_shop(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<WarmUpQuery>,
) -> ApiResult<()> {
    let shop_id = parse_shop_id(&id)?;
    let lease = query
        .lease_secs
        .map_or(state.default_lease, Duration::from_secs);
    debug!(shop_id = %shop_id, user_id = %user.id, lease_secs = lease.as_secs(), "Warm-up request");

    state.shop_service.warm_up(shop_id, lease).await?;
    ok_empty()
}

fn parse_shop_id(raw: &str) -> Result<ShopId, DianpingError> {
    raw.parse()
        .map_err(|_| DianpingError::validation(format!("Invalid shop id: {}", raw)))
}
