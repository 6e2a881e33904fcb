//! FISO server - multi-cloud cost optimizer
//!
//! Probes the configured cloud providers on an interval and serves
//! recommendations, cost trends and measurement history over HTTP.

use anyhow::{Context, Result};
use fiso_lib::{
    health::{components, HealthRegistry},
    CostOptimizer, ProbeLoop,
};
use fiso_server::{api, config::ServerConfig};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting fiso-server");

    let config = ServerConfig::load()?;
    info!(
        instance = %config.instance,
        providers = config.providers.len(),
        history_capacity = config.history_capacity,
        "Server configured"
    );

    let optimizer = Arc::new(
        CostOptimizer::new(config.providers.clone(), config.optimizer_config())
            .context("Failed to create optimizer")?,
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::PROBE).await;
    health_registry.register(components::HISTORY).await;

    optimizer
        .logger()
        .log_startup(SERVER_VERSION, &optimizer.providers());

    let app_state = Arc::new(api::AppState::new(health_registry.clone(), optimizer.clone()));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let loop_handle = match config.probe_interval() {
        Some(interval) => {
            let probe_loop = ProbeLoop::new(optimizer.clone(), health_registry.clone(), interval);
            Some(tokio::spawn(probe_loop.run(shutdown_tx.subscribe())))
        }
        None => {
            info!("Background probing disabled");
            None
        }
    };

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(
        config.api_port,
        app_state,
        shutdown_tx.subscribe(),
    ));

    tokio::signal::ctrl_c().await?;
    optimizer.logger().log_shutdown("SIGINT received");
    health_registry.set_ready(false).await;
    let _ = shutdown_tx.send(());

    if let Some(handle) = loop_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Probe loop task failed");
        }
    }
    match api_handle.await {
        Ok(Err(e)) => warn!(error = %e, "API server exited with error"),
        Err(e) => warn!(error = %e, "API server task failed"),
        Ok(Ok(())) => {}
    }

    info!("Shutdown complete");
    Ok(())
}
