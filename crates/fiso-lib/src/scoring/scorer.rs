//! Weighted efficiency score

use crate::models::ProviderMetric;

/// Response times at or above this ceiling score zero on the latency term
pub const RESPONSE_TIME_CEILING_MS: f64 = 5000.0;

/// Costs at or above this ceiling (USD per invocation) score zero on the cost term
pub const COST_CEILING: f64 = 0.001;

pub const RESPONSE_TIME_WEIGHT: f64 = 0.4;
pub const COST_WEIGHT: f64 = 0.3;
pub const AVAILABILITY_WEIGHT: f64 = 0.3;

/// Compute the 0-100 efficiency score of a metric.
///
/// Failed probes, and probes with a zero response time, score 0. Values past
/// the latency and cost ceilings tie at the floor of their term.
pub fn efficiency_score(metric: &ProviderMetric) -> f64 {
    let response_time_ms = match metric.response_time_ms {
        Some(ms) if ms > 0.0 && metric.success_rate > 0.0 => ms,
        _ => return 0.0,
    };

    let response_time_score =
        ((RESPONSE_TIME_CEILING_MS - response_time_ms) / RESPONSE_TIME_CEILING_MS).max(0.0);
    let cost_score = ((COST_CEILING - metric.cost_per_invocation) / COST_CEILING).max(0.0);
    let availability_score = metric.availability / 100.0;

    let efficiency = 100.0
        * (RESPONSE_TIME_WEIGHT * response_time_score
            + COST_WEIGHT * cost_score
            + AVAILABILITY_WEIGHT * availability_score);

    efficiency.clamp(0.0, 100.0)
}
