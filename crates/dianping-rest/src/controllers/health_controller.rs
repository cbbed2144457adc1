//! Health check controller.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use dianping_core::HealthStatus;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: &'static str,
    /// Application version.
    pub version: String,
    /// Status of each dependency, keyed by name.
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Status of one dependency.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Creates the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

/// Creates the Prometheus scrape route at `path`.
pub fn metrics_router(path: &str) -> Router<AppState> {
    Router::new().route(path, get(metrics))
}

async fn probe(state: &AppState) -> Vec<(String, HealthStatus)> {
    join_all(state.health_checks.iter().map(|check| async move {
        (check.name().to_string(), check.check().await)
    }))
    .await
}

/// Health check endpoint. Always 200; reports each dependency.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let results = probe(&state).await;

    let status = if results.iter().any(|(_, s)| s.is_unhealthy()) {
        "unhealthy"
    } else if results.iter().any(|(_, s)| !s.is_healthy()) {
        "degraded"
    } else {
        "healthy"
    };

    let components = results
        .into_iter()
        .map(|(name, s)| {
            let detail = match &s {
                HealthStatus::Healthy => None,
                HealthStatus::Degraded(msg) | HealthStatus::Unhealthy(msg) => Some(msg.clone()),
            };
            (
                name,
                ComponentHealth {
                    status: s.label(),
                    detail,
                },
            )
        })
        .collect();

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        components,
    })
}

/// Readiness check endpoint. 503 while any dependency is unhealthy.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if probe(&state).await.iter().any(|(_, s)| s.is_unhealthy()) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}
