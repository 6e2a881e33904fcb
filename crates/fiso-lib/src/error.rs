//! Error types for the cost optimizer

use crate::models::Provider;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single provider probe did not produce a usable measurement.
///
/// Contained to that provider's metric; never aborts a round.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    #[error("probe timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

impl ProbeFailure {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeFailure::Timeout => "timeout",
            ProbeFailure::Connect(_) => "connect",
            ProbeFailure::Status(_) => "status",
            ProbeFailure::Request(_) => "request",
        }
    }
}

/// Errors surfaced by the optimizer core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    /// Every provider failed in the same round
    #[error("No providers available")]
    NoProvidersAvailable,

    /// Not enough retained samples for trend queries
    #[error("Insufficient data for trend analysis: {available} samples, need {required}")]
    InsufficientHistory { available: usize, required: usize },

    /// The caller cancelled an in-flight round
    #[error("Probe round cancelled")]
    RoundCancelled,

    /// Endpoint configuration rejected at load time
    #[error("Invalid endpoint for {provider}: {reason}")]
    InvalidEndpoint { provider: Provider, reason: String },

    /// No endpoints configured at all
    #[error("No provider endpoints configured")]
    NoEndpoints,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl OptimizerError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            OptimizerError::NoProvidersAvailable => "no_providers_available",
            OptimizerError::InsufficientHistory { .. } => "insufficient_history",
            OptimizerError::RoundCancelled => "round_cancelled",
            OptimizerError::InvalidEndpoint { .. } => "invalid_endpoint",
            OptimizerError::NoEndpoints => "no_endpoints",
            OptimizerError::HttpClient(_) => "http_client",
        }
    }
}

pub type Result<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_failure_kind_labels() {
        assert_eq!(ProbeFailure::Timeout.kind(), "timeout");
        assert_eq!(ProbeFailure::Status(503).kind(), "status");
        assert_eq!(ProbeFailure::Status(503).to_string(), "unexpected HTTP status 503");
    }

    #[test]
    fn test_probe_failure_serializes_tagged() {
        let json = serde_json::to_value(ProbeFailure::Status(404)).unwrap();
        assert_eq!(json["kind"], "status");
        assert_eq!(json["detail"], 404);

        let json = serde_json::to_value(ProbeFailure::Timeout).unwrap();
        assert_eq!(json["kind"], "timeout");
    }

    #[test]
    fn test_insufficient_history_message() {
        let err = OptimizerError::InsufficientHistory {
            available: 3,
            required: 10,
        };
        assert!(err.to_string().contains("3 samples, need 10"));
        assert_eq!(err.code(), "insufficient_history");
    }
}
