//! Observability infrastructure for the cost optimizer
//!
//! Provides:
//! - Prometheus metrics (probe latency, probe failures, rounds, history size, scores)
//! - Structured JSON logging with tracing

use crate::error::ProbeFailure;
use crate::models::{Provider, Recommendation};
use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for probe latency (in seconds)
const PROBE_LATENCY_BUCKETS: &[f64] = &[
    0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<OptimizerMetricsInner> = OnceLock::new();

struct OptimizerMetricsInner {
    probe_latency_seconds: HistogramVec,
    probe_failures: IntCounterVec,
    rounds_completed: IntCounter,
    rounds_cancelled: IntCounter,
    history_entries: IntGauge,
    efficiency_score: GaugeVec,
    recommendations_generated: IntCounter,
}

impl OptimizerMetricsInner {
    fn new() -> Self {
        Self {
            probe_latency_seconds: register_histogram_vec!(
                "fiso_probe_latency_seconds",
                "Health-check latency of successful provider probes",
                &["provider"],
                PROBE_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register probe_latency_seconds"),

            probe_failures: register_int_counter_vec!(
                "fiso_probe_failures_total",
                "Provider probes that timed out, errored or returned non-200",
                &["provider", "kind"]
            )
            .expect("Failed to register probe_failures"),

            rounds_completed: register_int_counter!(
                "fiso_probe_rounds_completed_total",
                "Probe rounds that ran to completion"
            )
            .expect("Failed to register rounds_completed"),

            rounds_cancelled: register_int_counter!(
                "fiso_probe_rounds_cancelled_total",
                "Probe rounds cancelled before completion"
            )
            .expect("Failed to register rounds_cancelled"),

            history_entries: register_int_gauge!(
                "fiso_history_entries",
                "Number of metrics retained in the history buffer"
            )
            .expect("Failed to register history_entries"),

            efficiency_score: register_gauge_vec!(
                "fiso_efficiency_score",
                "Most recent efficiency score per provider",
                &["provider"]
            )
            .expect("Failed to register efficiency_score"),

            recommendations_generated: register_int_counter!(
                "fiso_recommendations_generated_total",
                "Total number of provider recommendations generated"
            )
            .expect("Failed to register recommendations_generated"),
        }
    }
}

/// Optimizer metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct OptimizerMetrics {
    _private: (),
}

impl Default for OptimizerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(OptimizerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &OptimizerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_probe_latency(&self, provider: Provider, duration_secs: f64) {
        self.inner()
            .probe_latency_seconds
            .with_label_values(&[provider.as_str()])
            .observe(duration_secs);
    }

    pub fn inc_probe_failures(&self, provider: Provider, failure: &ProbeFailure) {
        self.inner()
            .probe_failures
            .with_label_values(&[provider.as_str(), failure.kind()])
            .inc();
    }

    pub fn inc_rounds_completed(&self) {
        self.inner().rounds_completed.inc();
    }

    pub fn inc_rounds_cancelled(&self) {
        self.inner().rounds_cancelled.inc();
    }

    pub fn set_history_entries(&self, entries: i64) {
        self.inner().history_entries.set(entries);
    }

    pub fn set_efficiency_score(&self, provider: Provider, score: f64) {
        self.inner()
            .efficiency_score
            .with_label_values(&[provider.as_str()])
            .set(score);
    }

    pub fn inc_recommendations_generated(&self) {
        self.inner().recommendations_generated.inc();
    }
}

/// Structured logger for optimizer events
///
/// Provides consistent JSON-formatted logging for rounds, probe failures,
/// recommendations and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a completed probe round
    pub fn log_round(&self, providers: usize, available: usize, duration_ms: u128) {
        if available == 0 {
            warn!(
                event = "round_completed",
                instance = %self.instance,
                providers = providers,
                available = available,
                duration_ms = duration_ms,
                "Probe round completed with no provider available"
            );
        } else {
            info!(
                event = "round_completed",
                instance = %self.instance,
                providers = providers,
                available = available,
                duration_ms = duration_ms,
                "Probe round completed"
            );
        }
    }

    /// Log a single provider probe failure
    pub fn log_probe_failure(&self, provider: Provider, region: &str, failure: &ProbeFailure) {
        warn!(
            event = "probe_failed",
            instance = %self.instance,
            provider = %provider,
            region = %region,
            kind = failure.kind(),
            error = %failure,
            "Provider probe failed"
        );
    }

    /// Log a generated recommendation
    pub fn log_recommendation(&self, recommendation: &Recommendation) {
        info!(
            event = "recommendation_generated",
            instance = %self.instance,
            provider = %recommendation.provider,
            efficiency_score = recommendation.efficiency_score,
            candidates = recommendation.all_options.len(),
            "Generated provider recommendation"
        );
    }

    /// Log optimizer startup
    pub fn log_startup(&self, version: &str, providers: &[Provider]) {
        let providers: Vec<&str> = providers.iter().map(|p| p.as_str()).collect();
        info!(
            event = "optimizer_started",
            instance = %self.instance,
            version = %version,
            providers = ?providers,
            "Cost optimizer started"
        );
    }

    /// Log optimizer shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "optimizer_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Cost optimizer shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimizer_metrics_creation() {
        // Registration happens once per process; repeated handles share it
        let metrics = OptimizerMetrics::new();
        let again = OptimizerMetrics::new();

        metrics.observe_probe_latency(Provider::Aws, 0.12);
        metrics.inc_probe_failures(Provider::Gcp, &ProbeFailure::Timeout);
        metrics.inc_rounds_completed();
        again.inc_rounds_cancelled();
        again.set_history_entries(42);
        again.set_efficiency_score(Provider::Azure, 88.5);
        again.inc_recommendations_generated();
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("fiso-test");
        assert_eq!(logger.instance, "fiso-test");
    }
}
