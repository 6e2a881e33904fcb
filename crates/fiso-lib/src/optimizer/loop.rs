//! Background probe loop
//!
//! Runs a probe round on a fixed interval so the history window keeps filling
//! between API requests, and reflects each round in the health registry.

use super::CostOptimizer;
use crate::error::OptimizerError;
use crate::health::{components, ComponentHealth, HealthRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default interval between background rounds
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic probe loop
pub struct ProbeLoop {
    optimizer: Arc<CostOptimizer>,
    health: HealthRegistry,
    interval: Duration,
}

impl ProbeLoop {
    pub fn new(optimizer: Arc<CostOptimizer>, health: HealthRegistry, interval: Duration) -> Self {
        Self {
            optimizer,
            health,
            interval,
        }
    }

    /// Run until the shutdown signal fires; an in-flight round is cancelled
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            providers = self.optimizer.endpoints().len(),
            "Starting probe loop"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut round_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => {
                    info!("Shutting down probe loop");
                    break;
                }
            }

            let result = self
                .optimizer
                .probe_round_until(async {
                    let _ = shutdown.recv().await;
                })
                .await;

            match result {
                Ok(metrics) => {
                    round_count += 1;
                    let available = metrics.iter().filter(|m| m.is_available()).count();
                    self.health
                        .update(
                            components::PROBE,
                            ComponentHealth::from_round(available, metrics.len()),
                        )
                        .await;
                    self.health.set_healthy(components::HISTORY).await;
                    debug!(round = round_count, available = available, "Background round complete");
                }
                Err(OptimizerError::RoundCancelled) => {
                    info!("Probe round cancelled by shutdown");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Background probe round failed");
                    self.health
                        .set_degraded(components::PROBE, e.to_string())
                        .await;
                }
            }
        }
    }
}
