//! Main application router.

use crate::{
    controllers::{health_controller, shop_controller, shop_type_controller, user_controller},
    middleware::{logging_middleware, require_login, session_middleware},
    state::AppState,
};
use axum::{http::HeaderValue, middleware, routing::get, Router};
use dianping_config::{ObservabilityConfig, ServerConfig};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the main application router.
pub fn create_router(
    state: AppState,
    server_config: &ServerConfig,
    observability: &ObservabilityConfig,
) -> Router {
    let cors = create_cors_layer(server_config);

    // Session resolution runs for every API request; handlers decide whether
    // a login is required.
    let api_router = Router::new()
        .nest("/shop", shop_controller::router())
        .nest("/shop-type", shop_type_controller::router())
        .nest(
            "/user",
            user_controller::router().route_layer(middleware::from_fn(require_login)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    let mut router = Router::new()
        .merge(health_controller::router())
        .nest("/api/v1", api_router)
        .route("/", get(root));

    if observability.metrics_enabled && state.metrics.is_some() {
        router = router.merge(health_controller::metrics_router(&observability.metrics_path));
    }

    let router = router
        .with_state(state)
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging_middleware));

    info!("Router created with REST endpoints");
    router
}

/// Creates a CORS layer based on server configuration.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if server_config.cors_enabled {
        if server_config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::permissive()
        } else {
            let origins: Vec<HeaderValue> = server_config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    }
}

/// Root endpoint handler.
async fn root() -> &'static str {
    "Dianping API v1"
}
