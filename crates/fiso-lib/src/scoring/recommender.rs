//! Provider ranking and recommendation text

use super::efficiency_score;
use crate::error::{OptimizerError, Result};
use crate::models::{ProviderMetric, Recommendation, ScoredOption};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Categorical bucket used in reasoning text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Excellent,
    Good,
    Acceptable,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Excellent => "excellent",
            Tier::Good => "good",
            Tier::Acceptable => "acceptable",
        };
        f.write_str(label)
    }
}

pub fn response_time_tier(response_time_ms: f64) -> Tier {
    if response_time_ms < 1000.0 {
        Tier::Excellent
    } else if response_time_ms < 2000.0 {
        Tier::Good
    } else {
        Tier::Acceptable
    }
}

pub fn cost_tier(cost_per_invocation: f64) -> Tier {
    if cost_per_invocation < 0.0001 {
        Tier::Excellent
    } else if cost_per_invocation < 0.0005 {
        Tier::Good
    } else {
        Tier::Acceptable
    }
}

pub fn availability_tier(availability: f64) -> Tier {
    if availability >= 99.9 {
        Tier::Excellent
    } else if availability >= 99.0 {
        Tier::Good
    } else {
        Tier::Acceptable
    }
}

/// Score every available provider and order them best first.
///
/// Providers with `success_rate == 0` are dropped rather than scored. Equal
/// scores fall back to provider name ascending.
pub fn rank(metrics: &[ProviderMetric]) -> Vec<ScoredOption> {
    let mut options: Vec<ScoredOption> = metrics
        .iter()
        .filter(|m| m.is_available())
        .filter_map(|m| {
            let response_time_ms = m.response_time_ms?;
            Some(ScoredOption {
                provider: m.provider,
                region: m.region.clone(),
                efficiency_score: efficiency_score(m),
                response_time_ms,
                cost_per_invocation: m.cost_per_invocation,
                availability: m.availability,
            })
        })
        .collect();

    options.sort_by(compare_options);
    options
}

fn compare_options(a: &ScoredOption, b: &ScoredOption) -> Ordering {
    b.efficiency_score
        .total_cmp(&a.efficiency_score)
        .then_with(|| a.provider.as_str().cmp(b.provider.as_str()))
}

/// Pick the best provider of a round
pub fn recommend(metrics: &[ProviderMetric]) -> Result<Recommendation> {
    let all_options = rank(metrics);
    let best = all_options
        .first()
        .cloned()
        .ok_or(OptimizerError::NoProvidersAvailable)?;

    Ok(Recommendation {
        provider: best.provider,
        efficiency_score: best.efficiency_score,
        reasoning: reasoning(&best),
        all_options,
    })
}

fn reasoning(best: &ScoredOption) -> String {
    format!(
        "{} ({}) selected with efficiency score {:.1}: {} response time ({:.0}ms), {} cost (${:.7} per invocation), {} availability ({:.2}%)",
        best.provider.display_name(),
        best.region,
        best.efficiency_score,
        response_time_tier(best.response_time_ms),
        best.response_time_ms,
        cost_tier(best.cost_per_invocation),
        best.cost_per_invocation,
        availability_tier(best.availability),
        best.availability,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeFailure;
    use crate::models::{Provider, ProviderEndpoint};

    fn endpoint(provider: Provider, cost: f64, availability: f64) -> ProviderEndpoint {
        ProviderEndpoint::new(provider, "http://localhost/health", "region-1", cost, availability)
    }

    fn up(provider: Provider, ms: f64, cost: f64, availability: f64) -> ProviderMetric {
        ProviderMetric::reachable(&endpoint(provider, cost, availability), ms)
    }

    fn down(provider: Provider) -> ProviderMetric {
        ProviderMetric::unreachable(&endpoint(provider, 0.0, 100.0), ProbeFailure::Timeout)
    }

    #[test]
    fn test_tiers() {
        assert_eq!(response_time_tier(999.0), Tier::Excellent);
        assert_eq!(response_time_tier(1000.0), Tier::Good);
        assert_eq!(response_time_tier(2000.0), Tier::Acceptable);
        assert_eq!(cost_tier(0.00005), Tier::Excellent);
        assert_eq!(cost_tier(0.0003), Tier::Good);
        assert_eq!(cost_tier(0.0005), Tier::Acceptable);
        assert_eq!(availability_tier(99.95), Tier::Excellent);
        assert_eq!(availability_tier(99.5), Tier::Good);
        assert_eq!(availability_tier(98.0), Tier::Acceptable);
    }

    #[test]
    fn test_recommends_highest_score() {
        let metrics = vec![
            up(Provider::Aws, 1500.0, 0.0002, 99.95),
            up(Provider::Azure, 300.0, 0.0002, 99.95),
            up(Provider::Gcp, 800.0, 0.0004, 99.9),
        ];

        let rec = recommend(&metrics).unwrap();
        assert_eq!(rec.provider, Provider::Azure);
        assert_eq!(rec.all_options.len(), 3);
        assert!(rec
            .all_options
            .windows(2)
            .all(|w| w[0].efficiency_score >= w[1].efficiency_score));
        assert!(rec.reasoning.contains("Azure"));
        assert!(rec.reasoning.contains("excellent response time"));
    }

    #[test]
    fn test_single_working_provider_wins_regardless_of_score() {
        let metrics = vec![
            down(Provider::Aws),
            up(Provider::Azure, 4900.0, 0.01, 50.0),
            down(Provider::Gcp),
        ];

        let rec = recommend(&metrics).unwrap();
        assert_eq!(rec.provider, Provider::Azure);
        assert_eq!(rec.all_options.len(), 1);
        assert!(rec.reasoning.contains("acceptable cost"));
    }

    #[test]
    fn test_failed_providers_excluded_from_ranking() {
        let metrics = vec![up(Provider::Aws, 200.0, 0.0, 99.0), down(Provider::Gcp)];
        let ranked = rank(&metrics);
        assert_eq!(ranked.len(), 1);
        assert!(ranked.iter().all(|o| o.provider != Provider::Gcp));
    }

    #[test]
    fn test_no_providers_available() {
        let metrics = vec![down(Provider::Aws), down(Provider::Azure), down(Provider::Gcp)];
        assert_eq!(
            recommend(&metrics).unwrap_err(),
            OptimizerError::NoProvidersAvailable
        );
        assert_eq!(recommend(&[]).unwrap_err(), OptimizerError::NoProvidersAvailable);
    }

    #[test]
    fn test_ties_break_by_provider_name() {
        // Insertion order deliberately puts gcp first
        let metrics = vec![
            up(Provider::Gcp, 400.0, 0.0002, 99.9),
            up(Provider::Azure, 400.0, 0.0002, 99.9),
            up(Provider::Aws, 400.0, 0.0002, 99.9),
        ];

        let rec = recommend(&metrics).unwrap();
        assert_eq!(rec.provider, Provider::Aws);
        let order: Vec<Provider> = rec.all_options.iter().map(|o| o.provider).collect();
        assert_eq!(order, vec![Provider::Aws, Provider::Azure, Provider::Gcp]);
    }

    #[test]
    fn test_recommend_is_idempotent() {
        let metrics = vec![
            up(Provider::Aws, 700.0, 0.0002, 99.95),
            up(Provider::Azure, 650.0, 0.0003, 99.9),
            down(Provider::Gcp),
        ];
        assert_eq!(recommend(&metrics).unwrap(), recommend(&metrics).unwrap());
    }
}
