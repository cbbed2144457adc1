//! Server startup utilities.

use dianping_config::AppConfig;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r#"
     _ _                   _
  __| (_) __ _ _ __  _ __ (_)_ __   __ _
 / _` | |/ _` | '_ \| '_ \| | '_ \ / _` |
| (_| | | (_| | | | | |_) | | | | | (_| |
 \__,_|_|\__,_|_| |_| .__/|_|_| |_|\__, |
                    |_|            |___/
    "#
    );
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let addr = config.server.rest_addr();
    info!("{}", separator);
    info!("REST API:  http://{}/api/v1", addr);
    info!("Health:    http://{}/health", addr);
    if config.observability.metrics_enabled {
        info!("Metrics:   http://{}{}", addr, config.observability.metrics_path);
    }
    info!("Strategy:  {}", config.cache.strategy);
    info!(
        "Cache:     {}",
        if config.redis.enabled { "redis" } else { "in-memory" }
    );
    info!("{}", separator);
}
