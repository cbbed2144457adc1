//! Logging and metrics setup.

use dianping_config::ObservabilityConfig;
use dianping_core::{DianpingError, DianpingResult};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info,dianping=debug,tower_http=debug";

/// Builds the filter: `RUST_LOG` wins, then the configured level, then
/// [`DEFAULT_FILTER`].
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            if config.log_level.trim().is_empty() {
                EnvFilter::try_new(DEFAULT_FILTER)
            } else {
                EnvFilter::try_new(format!(
                    "{},dianping=debug,tower_http=debug",
                    config.log_level
                ))
            }
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    if config.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(true))
            .init();
    }
}

/// Installs the Prometheus recorder and describes the cache metrics.
pub fn init_metrics() -> DianpingResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| DianpingError::Configuration(format!("Failed to install metrics recorder: {}", e)))?;
    dianping_cache::metrics::register_metrics();
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_uses_configured_level() {
        let config = ObservabilityConfig {
            log_level: "warn".to_string(),
            ..ObservabilityConfig::default()
        };
        let filter = env_filter(&config).to_string();
        if std::env::var("RUST_LOG").is_err() {
            assert!(filter.contains("warn"));
            assert!(filter.contains("dianping=debug"));
        }
    }
}
