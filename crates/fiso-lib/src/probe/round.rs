//! Concurrent probe rounds
//!
//! Fans out one probe per provider into a `JoinSet` and joins them under a
//! single round deadline. Outstanding probes are aborted when the deadline
//! passes or the caller cancels.

use super::HealthProbe;
use crate::error::{OptimizerError, ProbeFailure, Result};
use crate::models::{ProviderEndpoint, ProviderMetric};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, warn};

/// Per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack added on top of the probe timeout to form the round deadline
pub const DEFAULT_DEADLINE_GRACE: Duration = Duration::from_millis(500);

/// Endpoint index and either the probe latency or its failure
type ProbeOutcome = (usize, std::result::Result<Duration, ProbeFailure>);

/// Configuration for probe rounds
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub deadline_grace: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            deadline_grace: DEFAULT_DEADLINE_GRACE,
        }
    }
}

impl ProbeConfig {
    /// Upper bound on the wall-clock length of one round
    pub fn round_deadline(&self) -> Duration {
        self.timeout + self.deadline_grace
    }
}

/// Probes every configured provider once per round
#[derive(Clone)]
pub struct ProviderProbe {
    probe: Arc<dyn HealthProbe>,
    endpoints: Arc<Vec<ProviderEndpoint>>,
    config: ProbeConfig,
}

impl ProviderProbe {
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        endpoints: Vec<ProviderEndpoint>,
        config: ProbeConfig,
    ) -> Self {
        Self {
            probe,
            endpoints: Arc::new(endpoints),
            config,
        }
    }

    pub fn endpoints(&self) -> &[ProviderEndpoint] {
        &self.endpoints
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run one round to completion
    pub async fn run_round(&self) -> Result<Vec<ProviderMetric>> {
        self.run_round_until(std::future::pending()).await
    }

    /// Run one round, aborting every in-flight probe if `cancel` resolves first.
    ///
    /// Metrics come back in endpoint configuration order. A probe still
    /// running at the round deadline is reported as a timeout.
    pub async fn run_round_until<F>(&self, cancel: F) -> Result<Vec<ProviderMetric>>
    where
        F: Future<Output = ()>,
    {
        let mut tasks: JoinSet<ProbeOutcome> = JoinSet::new();

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            let probe = Arc::clone(&self.probe);
            let url = endpoint.health_url.clone();
            let probe_timeout = self.config.timeout;

            tasks.spawn(async move {
                let start = Instant::now();
                let outcome = match timeout(probe_timeout, probe.check(&url)).await {
                    Ok(Ok(())) => Ok(start.elapsed()),
                    Ok(Err(failure)) => Err(failure),
                    Err(_) => Err(ProbeFailure::Timeout),
                };
                (index, outcome)
            });
        }

        let deadline = Instant::now() + self.config.round_deadline();
        let mut slots: Vec<Option<ProviderMetric>> = vec![None; self.endpoints.len()];
        let mut deadline_passed = false;

        tokio::pin!(cancel);

        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    tasks.abort_all();
                    debug!(outstanding = tasks.len(), "Probe round cancelled");
                    return Err(OptimizerError::RoundCancelled);
                }
                joined = tasks.join_next() => match joined {
                    Some(joined) => self.record(&mut slots, joined),
                    None => break,
                },
                _ = sleep_until(deadline) => {
                    // Probes woken on the deadline tick still count
                    tokio::task::yield_now().await;
                    while let Some(joined) = tasks.try_join_next() {
                        self.record(&mut slots, joined);
                    }

                    if !tasks.is_empty() {
                        warn!(outstanding = tasks.len(), "Round deadline reached, aborting outstanding probes");
                        tasks.abort_all();
                    }
                    deadline_passed = true;
                    break;
                }
            }
        }

        let metrics = slots
            .into_iter()
            .zip(self.endpoints.iter())
            .map(|(slot, endpoint)| {
                slot.unwrap_or_else(|| {
                    let failure = if deadline_passed {
                        ProbeFailure::Timeout
                    } else {
                        ProbeFailure::Request("probe task terminated".to_string())
                    };
                    ProviderMetric::unreachable(endpoint, failure)
                })
            })
            .collect();

        Ok(metrics)
    }

    fn record(
        &self,
        slots: &mut [Option<ProviderMetric>],
        joined: std::result::Result<ProbeOutcome, JoinError>,
    ) {
        match joined {
            Ok((index, outcome)) => {
                let endpoint = &self.endpoints[index];
                slots[index] = Some(match outcome {
                    Ok(elapsed) => {
                        ProviderMetric::reachable(endpoint, elapsed.as_secs_f64() * 1000.0)
                    }
                    Err(failure) => ProviderMetric::unreachable(endpoint, failure),
                });
            }
            Err(e) => {
                warn!(error = %e, "Probe task failed");
            }
        }
    }
}
