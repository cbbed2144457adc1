//! User controller.

use crate::{
    extractors::CurrentUser,
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{routing::get, Router};
use dianping_core::UserDto;

/// Creates the user router.
pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// The logged-in user.
async fn me(CurrentUser(user): CurrentUser) -> ApiResult<UserDto> {
    ok(user)
}
