//! Session middleware.

use crate::{responses::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dianping_core::DianpingError;
use dianping_service::RequestContext;
use tracing::{debug, warn};

/// Resolves the login token and stores a [`RequestContext`] in the request
/// extensions.
///
/// Never rejects: requests without a valid session continue anonymously and
/// the handler decides whether a login is required.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let presented = token(request.headers(), &state.token_header).map(str::to_owned);
    let ctx = match presented {
        Some(token) => match state.session_service.resolve(&token).await {
            Ok(user) => RequestContext { user },
            Err(e) => {
                warn!(error = %e, "Session lookup failed; continuing anonymously");
                RequestContext::anonymous()
            }
        },
        None => RequestContext::anonymous(),
    };

    if let Some(user) = &ctx.user {
        debug!(user_id = %user.id, "Authenticated request");
    }
    request.extensions_mut().insert(ctx);

    next.run(request).await
}

/// Rejects requests without a logged-in user with 401.
///
/// Must be layered inside [`session_middleware`].
pub async fn require_login(request: Request<Body>, next: Next) -> Response {
    let logged_in = request
        .extensions()
        .get::<RequestContext>()
        .is_some_and(RequestContext::is_authenticated);
    if !logged_in {
        return AppError(DianpingError::unauthorized("login required")).into_response();
    }

    next.run(request).await
}

/// Reads the token from `header`, accepting an optional `Bearer ` prefix.
fn token<'a>(headers: &'a HeaderMap, header: &HeaderName) -> Option<&'a str> {
    let value = headers.get(header)?.to_str().ok()?.trim();
    let value = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!value.is_empty()).then_some(value)
}
