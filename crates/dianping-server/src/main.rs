//! # Dianping Server
//!
//! Main entry point for the Dianping cache backend.

use dianping_config::ConfigLoader;
use dianping_core::DianpingResult;
use dianping_server::app::{Application, Components};
use dianping_server::{startup, telemetry};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let loader = match ConfigLoader::from_default_location() {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(loader).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(loader: ConfigLoader) -> DianpingResult<()> {
    let config = loader.get().await;
    telemetry::init_logging(&config.observability);

    startup::print_banner();
    info!("Starting Dianping server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    let metrics = if config.observability.metrics_enabled {
        match telemetry::init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Metrics disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let components = Components::connect(&config).await?;
    startup::print_startup_info(&config);

    let app = Application::new(config, components, metrics)?;
    app.serve(shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
