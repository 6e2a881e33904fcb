//! API client for communicating with the optimizer server

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// Error reported by the server
#[derive(Debug, Error)]
#[error("API error ({status}): {message}")]
pub struct ApiError {
    pub status: StatusCode,
    /// Machine-readable code from the error body, when present
    pub code: Option<String>,
    pub message: String,
}

/// API client for the optimizer server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_query(path, &[]).await
    }

    /// Make a GET request with URL-encoded query parameters
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a GET request, returning the body for any status the server
    /// reports with a JSON payload (health checks answer 503 with details)
    pub async fn get_with_status<T: DeserializeOwned>(&self, path: &str) -> Result<(StatusCode, T)> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if status.is_success() || status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.json().await.context("Failed to parse response")?;
            return Ok((status, body));
        }

        Err(Self::error(response).await.into())
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::error(response).await.into());
        }

        response.json().await.context("Failed to parse response")
    }

    async fn error(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => ApiError {
                status,
                code: err.code,
                message: err.error,
            },
            Err(_) => ApiError {
                status,
                code: None,
                message: body,
            },
        }
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ProbeFailure {
    pub fn describe(&self) -> String {
        match &self.detail {
            Some(serde_json::Value::String(detail)) => format!("{}: {}", self.kind, detail),
            Some(detail) => format!("{}: {}", self.kind, detail),
            None => self.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetric {
    pub provider: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    pub cost_per_invocation: f64,
    pub success_rate: f64,
    pub availability: f64,
    pub measured_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub available: usize,
    pub metrics: Vec<ProviderMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredOption {
    pub provider: String,
    pub region: String,
    pub efficiency_score: f64,
    pub response_time_ms: f64,
    pub cost_per_invocation: f64,
    pub availability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub provider: String,
    pub efficiency_score: f64,
    pub reasoning: String,
    pub all_options: Vec<ScoredOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTrend {
    pub samples: usize,
    #[serde(default)]
    pub response_time_ms: Option<SummaryStats>,
    pub cost_per_invocation: SummaryStats,
    pub mean_success_rate: f64,
    pub mean_availability: f64,
    pub savings_vs_cheapest_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub total_samples: usize,
    pub cheapest_provider: String,
    pub providers: BTreeMap<String, ProviderTrend>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryStats {
    pub entries: usize,
    pub capacity: usize,
    #[serde(default)]
    pub oldest_timestamp: Option<i64>,
    #[serde(default)]
    pub newest_timestamp: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResult {
    pub stats: HistoryStats,
    pub metrics: Vec<ProviderMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub query: String,
    pub intent: String,
    pub providers: Vec<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ScoredOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
