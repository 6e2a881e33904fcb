//! Multi-cloud cost optimizer
//!
//! Ties the probe, scorer, recommender and history together behind a single
//! instance owned by the process. All state is in memory.

mod r#loop;


pub use r#loop::{ProbeLoop, DEFAULT_PROBE_INTERVAL};

use crate::error::{OptimizerError, Result};
use crate::history::{
    HistoryBuffer, HistoryStats, TrendAnalysis, DEFAULT_HISTORY_CAPACITY, MIN_TREND_SAMPLES,
};
use crate::models::{
    validate_endpoints, Provider, ProviderEndpoint, ProviderMetric, Recommendation, ScoredOption,
};
use crate::observability::{OptimizerMetrics, StructuredLogger};
use crate::probe::{HealthProbe, HttpProbe, ProbeConfig, ProviderProbe};
use crate::query::{classify, QueryIntent, HELP_TEXT};
use crate::scoring;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

/// Configuration for the optimizer
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub probe: ProbeConfig,
    /// Maximum retained metrics across all providers
    pub history_capacity: usize,
    /// Retained metrics required before trends are reported
    pub min_trend_samples: usize,
    /// Instance name attached to structured log events
    pub instance: String,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            probe: ProbeConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_trend_samples: MIN_TREND_SAMPLES,
            instance: "fiso".to_string(),
        }
    }
}

/// Answer to a natural-language question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub intent: QueryIntent,
    pub providers: Vec<Provider>,
    pub answer: String,
    /// Ranked candidates backing the answer, when the intent ranks providers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ScoredOption>,
}

/// Probes providers, recommends the best one and tracks history
pub struct CostOptimizer {
    probe: ProviderProbe,
    history: Mutex<HistoryBuffer>,
    min_trend_samples: usize,
    metrics: OptimizerMetrics,
    logger: StructuredLogger,
}

impl CostOptimizer {
    /// Create an optimizer probing over HTTP
    pub fn new(endpoints: Vec<ProviderEndpoint>, config: OptimizerConfig) -> Result<Self> {
        let probe = Arc::new(HttpProbe::new(config.probe.timeout)?);
        Self::with_probe(probe, endpoints, config)
    }

    /// Create an optimizer with a custom probe transport
    pub fn with_probe(
        probe: Arc<dyn HealthProbe>,
        endpoints: Vec<ProviderEndpoint>,
        config: OptimizerConfig,
    ) -> Result<Self> {
        validate_endpoints(&endpoints)?;

        Ok(Self {
            probe: ProviderProbe::new(probe, endpoints, config.probe),
            history: Mutex::new(HistoryBuffer::new(config.history_capacity)),
            min_trend_samples: config.min_trend_samples,
            metrics: OptimizerMetrics::new(),
            logger: StructuredLogger::new(config.instance),
        })
    }

    pub fn endpoints(&self) -> &[ProviderEndpoint] {
        self.probe.endpoints()
    }

    pub fn providers(&self) -> Vec<Provider> {
        self.endpoints().iter().map(|e| e.provider).collect()
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn metrics(&self) -> &OptimizerMetrics {
        &self.metrics
    }

    /// Probe every provider once and record the round in history
    pub async fn probe_round(&self) -> Result<Vec<ProviderMetric>> {
        self.probe_round_until(std::future::pending()).await
    }

    /// Like [`probe_round`](Self::probe_round), but abandons the round without
    /// touching history if `cancel` resolves first
    pub async fn probe_round_until<F>(&self, cancel: F) -> Result<Vec<ProviderMetric>>
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();

        let metrics = match self.probe.run_round_until(cancel).await {
            Ok(metrics) => metrics,
            Err(e) => {
                if e == OptimizerError::RoundCancelled {
                    self.metrics.inc_rounds_cancelled();
                }
                return Err(e);
            }
        };

        for metric in &metrics {
            match (&metric.failure, metric.response_time_ms) {
                (Some(failure), _) => {
                    self.metrics.inc_probe_failures(metric.provider, failure);
                    self.logger
                        .log_probe_failure(metric.provider, &metric.region, failure);
                }
                (None, Some(ms)) => {
                    self.metrics.observe_probe_latency(metric.provider, ms / 1000.0);
                }
                (None, None) => {}
            }
        }

        // One lock acquisition per round keeps concurrent rounds from interleaving
        let entries = {
            let mut history = self.history.lock().await;
            history.push_round(metrics.iter().cloned());
            history.len()
        };

        let available = metrics.iter().filter(|m| m.is_available()).count();
        self.metrics.inc_rounds_completed();
        self.metrics.set_history_entries(entries as i64);
        self.logger
            .log_round(metrics.len(), available, start.elapsed().as_millis());

        Ok(metrics)
    }

    /// Recommend the best provider from an already collected round
    pub fn recommend(&self, metrics: &[ProviderMetric]) -> Result<Recommendation> {
        let recommendation = scoring::recommend(metrics)?;

        for option in &recommendation.all_options {
            self.metrics
                .set_efficiency_score(option.provider, option.efficiency_score);
        }
        self.metrics.inc_recommendations_generated();
        self.logger.log_recommendation(&recommendation);

        Ok(recommendation)
    }

    /// Run a fresh round and recommend from it
    pub async fn optimal_provider(&self) -> Result<Recommendation> {
        let metrics = self.probe_round().await?;
        self.recommend(&metrics)
    }

    /// Trend report over the retained history window
    pub async fn cost_trend_analysis(&self) -> Result<TrendAnalysis> {
        let history = self.history.lock().await;
        TrendAnalysis::from_history(&history, self.min_trend_samples)
    }

    /// Retained metrics, optionally for one provider, oldest first
    pub async fn history(&self, provider: Option<Provider>, limit: usize) -> Vec<ProviderMetric> {
        self.history.lock().await.recent(provider, limit)
    }

    pub async fn history_stats(&self) -> HistoryStats {
        self.history.lock().await.stats()
    }

    /// Classify a natural-language question and answer it
    pub async fn answer_query(&self, query: &str) -> Result<QueryResponse> {
        let parsed = classify(query);
        debug!(intent = ?parsed.intent, providers = ?parsed.providers, "Classified query");

        let mut response = QueryResponse {
            query: parsed.raw_input.clone(),
            intent: parsed.intent,
            providers: parsed.providers.clone(),
            answer: String::new(),
            options: Vec::new(),
        };

        match parsed.intent {
            QueryIntent::Unknown => {
                response.answer = HELP_TEXT.to_string();
            }
            QueryIntent::Trend => {
                let analysis = self.cost_trend_analysis().await?;
                response.answer = describe_trends(&analysis, &parsed.providers);
            }
            intent => {
                let metrics = self.probe_round().await?;
                let candidates: Vec<ProviderMetric> = metrics
                    .into_iter()
                    .filter(|m| parsed.providers.is_empty() || parsed.providers.contains(&m.provider))
                    .collect();
                let ranked = scoring::rank(&candidates);
                let top = select_for_intent(intent, &ranked)
                    .ok_or(OptimizerError::NoProvidersAvailable)?;

                response.answer = match intent {
                    QueryIntent::Cheapest => format!(
                        "{} is the cheapest available provider at ${:.7} per invocation",
                        top.provider.display_name(),
                        top.cost_per_invocation
                    ),
                    QueryIntent::Fastest => format!(
                        "{} responded fastest at {:.0}ms",
                        top.provider.display_name(),
                        top.response_time_ms
                    ),
                    QueryIntent::MostReliable => format!(
                        "{} offers the highest availability at {:.2}%",
                        top.provider.display_name(),
                        top.availability
                    ),
                    QueryIntent::Compare => describe_ranking(&ranked),
                    _ => self.recommend(&candidates)?.reasoning,
                };
                response.options = ranked;
            }
        }

        Ok(response)
    }
}

/// Pick the candidate an intent asks for; ties fall to the better-ranked option
fn select_for_intent(intent: QueryIntent, ranked: &[ScoredOption]) -> Option<ScoredOption> {
    match intent {
        QueryIntent::Cheapest => pick_by(ranked, |a, b| a.cost_per_invocation < b.cost_per_invocation),
        QueryIntent::Fastest => pick_by(ranked, |a, b| a.response_time_ms < b.response_time_ms),
        QueryIntent::MostReliable => pick_by(ranked, |a, b| a.availability > b.availability),
        _ => ranked.first().cloned(),
    }
}

fn pick_by<F>(ranked: &[ScoredOption], better: F) -> Option<ScoredOption>
where
    F: Fn(&ScoredOption, &ScoredOption) -> bool,
{
    let mut best: Option<&ScoredOption> = None;
    for option in ranked {
        match best {
            Some(current) if !better(option, current) => {}
            _ => best = Some(option),
        }
    }
    best.cloned()
}

fn describe_ranking(ranked: &[ScoredOption]) -> String {
    let parts: Vec<String> = ranked
        .iter()
        .enumerate()
        .map(|(i, o)| {
            format!(
                "{}. {} ({:.1})",
                i + 1,
                o.provider.display_name(),
                o.efficiency_score
            )
        })
        .collect();
    format!("Ranking by efficiency score: {}", parts.join(", "))
}

fn describe_trends(analysis: &TrendAnalysis, focus: &[Provider]) -> String {
    let mut parts = vec![format!(
        "Over the last {} samples {} was cheapest",
        analysis.total_samples,
        analysis.cheapest_provider.display_name()
    )];

    for (provider, trend) in &analysis.providers {
        if *provider == analysis.cheapest_provider {
            continue;
        }
        if !focus.is_empty() && !focus.contains(provider) {
            continue;
        }
        parts.push(format!(
            "switching from {} would save {:.1}%",
            provider.display_name(),
            trend.savings_vs_cheapest_percent
        ));
    }

    parts.join("; ")
}
