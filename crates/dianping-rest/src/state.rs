//! Application state for Axum handlers.

use axum::http::HeaderName;
use dianping_core::HealthCheck;
use dianping_service::{SessionService, ShopService, ShopTypeService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub shop_service: Arc<dyn ShopService>,
    pub shop_type_service: Arc<dyn ShopTypeService>,
    pub session_service: Arc<dyn SessionService>,
    /// Header the login token is read from.
    pub token_header: HeaderName,
    /// Lease used by warm-up requests that do not name one.
    pub default_lease: Duration,
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates a new application state without health checks or metrics.
    pub fn new(
        shop_service: Arc<dyn ShopService>,
        shop_type_service: Arc<dyn ShopTypeService>,
        session_service: Arc<dyn SessionService>,
        token_header: HeaderName,
        default_lease: Duration,
    ) -> Self {
        Self {
            shop_service,
            shop_type_service,
            session_service,
            token_header,
            default_lease,
            health_checks: Vec::new(),
            metrics: None,
        }
    }

    /// Adds a dependency probed by `/ready` and `/health`.
    #[must_use]
    pub fn with_health_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.health_checks.push(check);
        self
    }

    /// Enables the Prometheus scrape endpoint.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
