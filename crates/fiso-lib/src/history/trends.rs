//! Cost trend analysis over the retained history window

use super::HistoryBuffer;
use crate::error::{OptimizerError, Result};
use crate::models::{Provider, ProviderMetric};
use serde::Serialize;
use std::collections::BTreeMap;

/// Minimum retained entries before trends are reported
pub const MIN_TREND_SAMPLES: usize = 10;

/// Mean, sample standard deviation and range of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    /// `None` for an empty series. A single value has zero deviation.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() > 1 {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        } else {
            0.0
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            std_dev,
            min,
            max,
        })
    }
}

/// Per-provider aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderTrend {
    pub samples: usize,
    /// Over successful probes only; absent when the provider never answered
    pub response_time_ms: Option<SummaryStats>,
    pub cost_per_invocation: SummaryStats,
    pub mean_success_rate: f64,
    pub mean_availability: f64,
    /// How much cheaper the cheapest provider is, as a percentage of this
    /// provider's mean cost. Zero for the cheapest provider itself.
    pub savings_vs_cheapest_percent: f64,
}

/// Trend report over every retained entry, weighted equally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub total_samples: usize,
    pub cheapest_provider: Provider,
    pub providers: BTreeMap<Provider, ProviderTrend>,
}

impl TrendAnalysis {
    /// Analyse the buffer, requiring at least `min_samples` entries
    pub fn from_history(history: &HistoryBuffer, min_samples: usize) -> Result<Self> {
        let required = min_samples.max(1);
        if history.len() < required {
            return Err(OptimizerError::InsufficientHistory {
                available: history.len(),
                required,
            });
        }

        let mut grouped: BTreeMap<Provider, Vec<&ProviderMetric>> = BTreeMap::new();
        for metric in history.iter() {
            grouped.entry(metric.provider).or_default().push(metric);
        }

        let mut providers = BTreeMap::new();
        for (provider, metrics) in &grouped {
            let response_times: Vec<f64> =
                metrics.iter().filter_map(|m| m.response_time_ms).collect();
            let costs: Vec<f64> = metrics.iter().map(|m| m.cost_per_invocation).collect();
            let n = metrics.len() as f64;

            let Some(cost_stats) = SummaryStats::from_values(&costs) else {
                continue;
            };

            providers.insert(
                *provider,
                ProviderTrend {
                    samples: metrics.len(),
                    response_time_ms: SummaryStats::from_values(&response_times),
                    cost_per_invocation: cost_stats,
                    mean_success_rate: metrics.iter().map(|m| m.success_rate).sum::<f64>() / n,
                    mean_availability: metrics.iter().map(|m| m.availability).sum::<f64>() / n,
                    savings_vs_cheapest_percent: 0.0,
                },
            );
        }

        // Grouping a non-empty buffer always yields at least one provider
        let (cheapest_provider, cheapest_cost) = providers
            .iter()
            .map(|(p, t)| (*p, t.cost_per_invocation.mean))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(OptimizerError::InsufficientHistory {
                available: history.len(),
                required,
            })?;

        for trend in providers.values_mut() {
            let mean_cost = trend.cost_per_invocation.mean;
            trend.savings_vs_cheapest_percent = if mean_cost > 0.0 {
                (mean_cost - cheapest_cost) / mean_cost * 100.0
            } else {
                0.0
            };
        }

        Ok(Self {
            total_samples: history.len(),
            cheapest_provider,
            providers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeFailure;
    use crate::models::ProviderEndpoint;

    fn endpoint(provider: Provider, cost: f64) -> ProviderEndpoint {
        ProviderEndpoint::new(provider, "http://localhost/health", "region-1", cost, 99.9)
    }

    fn filled_history(rounds: usize) -> HistoryBuffer {
        let mut history = HistoryBuffer::new(300);
        for i in 0..rounds {
            history.push(ProviderMetric::reachable(
                &endpoint(Provider::Aws, 0.0002),
                100.0 + i as f64,
            ));
            history.push(ProviderMetric::reachable(
                &endpoint(Provider::Gcp, 0.0004),
                200.0,
            ));
            history.push(ProviderMetric::unreachable(
                &endpoint(Provider::Azure, 0.0003),
                ProbeFailure::Timeout,
            ));
        }
        history
    }

    #[test]
    fn test_summary_stats() {
        let stats = SummaryStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!((stats.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);

        assert!(SummaryStats::from_values(&[]).is_none());
        assert_eq!(SummaryStats::from_values(&[3.0]).unwrap().std_dev, 0.0);
    }

    #[test]
    fn test_insufficient_history() {
        let history = filled_history(3);
        assert_eq!(history.len(), 9);

        let err = TrendAnalysis::from_history(&history, MIN_TREND_SAMPLES).unwrap_err();
        assert_eq!(
            err,
            OptimizerError::InsufficientHistory {
                available: 9,
                required: 10
            }
        );
    }

    #[test]
    fn test_populated_analysis() {
        let history = filled_history(4);
        let analysis = TrendAnalysis::from_history(&history, MIN_TREND_SAMPLES).unwrap();

        assert_eq!(analysis.total_samples, 12);
        assert_eq!(analysis.cheapest_provider, Provider::Aws);
        assert_eq!(analysis.providers.len(), 3);

        let aws = &analysis.providers[&Provider::Aws];
        assert_eq!(aws.samples, 4);
        assert_eq!(aws.mean_success_rate, 100.0);
        let rt = aws.response_time_ms.unwrap();
        assert_eq!(rt.min, 100.0);
        assert_eq!(rt.max, 103.0);
        assert_eq!(aws.savings_vs_cheapest_percent, 0.0);

        let gcp = &analysis.providers[&Provider::Gcp];
        assert!((gcp.savings_vs_cheapest_percent - 50.0).abs() < 1e-9);

        let azure = &analysis.providers[&Provider::Azure];
        assert_eq!(azure.mean_success_rate, 0.0);
        assert!(azure.response_time_ms.is_none());
    }

    #[test]
    fn test_analysis_serializes_provider_keys() {
        let history = filled_history(4);
        let analysis = TrendAnalysis::from_history(&history, MIN_TREND_SAMPLES).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json["providers"]["aws"].is_object());
        assert_eq!(json["cheapest_provider"], "aws");
    }
}
