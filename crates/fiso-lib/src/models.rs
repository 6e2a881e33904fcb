//! Core data models for the cost optimizer

use crate::error::{OptimizerError, ProbeFailure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Cloud vendor modeled as an interchangeable backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
        }
    }

    /// Human-facing vendor name used in reasoning text
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Azure => "Azure",
            Provider::Gcp => "GCP",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" | "amazon" => Ok(Provider::Aws),
            "azure" | "microsoft" => Ok(Provider::Azure),
            "gcp" | "google" => Ok(Provider::Gcp),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// Configured health-check target for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    pub provider: Provider,
    pub health_url: String,
    pub region: String,
    /// USD per function invocation
    pub cost_per_invocation: f64,
    /// Advertised availability percentage (0-100)
    pub availability: f64,
}

impl ProviderEndpoint {
    pub fn new(
        provider: Provider,
        health_url: impl Into<String>,
        region: impl Into<String>,
        cost_per_invocation: f64,
        availability: f64,
    ) -> Self {
        Self {
            provider,
            health_url: health_url.into(),
            region: region.into(),
            cost_per_invocation,
            availability,
        }
    }

    /// Reject endpoints that would produce nonsensical metrics
    pub fn validate(&self) -> Result<(), OptimizerError> {
        let invalid = |reason: String| OptimizerError::InvalidEndpoint {
            provider: self.provider,
            reason,
        };

        let url = Url::parse(&self.health_url)
            .map_err(|e| invalid(format!("bad health_url '{}': {}", self.health_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if !self.cost_per_invocation.is_finite() || self.cost_per_invocation < 0.0 {
            return Err(invalid(format!(
                "cost_per_invocation must be >= 0, got {}",
                self.cost_per_invocation
            )));
        }
        if !(0.0..=100.0).contains(&self.availability) {
            return Err(invalid(format!(
                "availability must be within 0-100, got {}",
                self.availability
            )));
        }
        Ok(())
    }

    /// Default endpoints for the three supported clouds
    pub fn defaults() -> Vec<ProviderEndpoint> {
        vec![
            ProviderEndpoint::new(
                Provider::Aws,
                "https://lambda.us-east-1.amazonaws.com/",
                "us-east-1",
                0.000_000_2,
                99.95,
            ),
            ProviderEndpoint::new(
                Provider::Azure,
                "https://management.azure.com/",
                "eastus",
                0.000_000_2,
                99.95,
            ),
            ProviderEndpoint::new(
                Provider::Gcp,
                "https://cloudfunctions.googleapis.com/",
                "us-central1",
                0.000_000_4,
                99.95,
            ),
        ]
    }
}

/// Validate a full endpoint set: each endpoint valid, no provider twice
pub fn validate_endpoints(endpoints: &[ProviderEndpoint]) -> Result<(), OptimizerError> {
    if endpoints.is_empty() {
        return Err(OptimizerError::NoEndpoints);
    }
    for (i, endpoint) in endpoints.iter().enumerate() {
        endpoint.validate()?;
        if endpoints[..i].iter().any(|e| e.provider == endpoint.provider) {
            return Err(OptimizerError::InvalidEndpoint {
                provider: endpoint.provider,
                reason: "configured more than once".to_string(),
            });
        }
    }
    Ok(())
}

/// One measurement of one provider in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetric {
    pub provider: Provider,
    pub region: String,
    /// Wall-clock latency of a successful probe; absent when the probe failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    pub cost_per_invocation: f64,
    /// 100 for a successful probe, 0 otherwise
    pub success_rate: f64,
    pub availability: f64,
    pub measured_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
}

impl ProviderMetric {
    /// Metric for a probe that returned HTTP 200
    pub fn reachable(endpoint: &ProviderEndpoint, response_time_ms: f64) -> Self {
        Self {
            provider: endpoint.provider,
            region: endpoint.region.clone(),
            response_time_ms: Some(response_time_ms.max(0.0)),
            cost_per_invocation: endpoint.cost_per_invocation,
            success_rate: 100.0,
            availability: endpoint.availability,
            measured_at: chrono::Utc::now().timestamp(),
            failure: None,
        }
    }

    /// Metric for a probe that errored, timed out or returned non-200
    pub fn unreachable(endpoint: &ProviderEndpoint, failure: ProbeFailure) -> Self {
        Self {
            provider: endpoint.provider,
            region: endpoint.region.clone(),
            response_time_ms: None,
            cost_per_invocation: endpoint.cost_per_invocation,
            success_rate: 0.0,
            availability: endpoint.availability,
            measured_at: chrono::Utc::now().timestamp(),
            failure: Some(failure),
        }
    }

    /// Eligible for ranking
    pub fn is_available(&self) -> bool {
        self.success_rate > 0.0
    }
}

/// One ranked candidate in a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredOption {
    pub provider: Provider,
    pub region: String,
    pub efficiency_score: f64,
    pub response_time_ms: f64,
    pub cost_per_invocation: f64,
    pub availability: f64,
}

/// Provider recommendation, computed fresh per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub provider: Provider,
    pub efficiency_score: f64,
    pub reasoning: String,
    /// Candidates in descending score order
    pub all_options: Vec<ScoredOption>,
}
