//! HTTP API for recommendations, history, health checks and Prometheus metrics

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fiso_lib::{
    health::{components, ComponentHealth, ComponentStatus, HealthRegistry},
    history::{HistoryStats, TrendAnalysis},
    CostOptimizer, OptimizerError, Provider, ProviderMetric, QueryResponse,
    Recommendation,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Default number of history entries returned when no limit is given
const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub optimizer: Arc<CostOptimizer>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, optimizer: Arc<CostOptimizer>) -> Self {
        Self {
            health_registry,
            optimizer,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Error returned by API handlers
#[derive(Debug)]
pub enum ApiError {
    Optimizer(OptimizerError),
    BadRequest(String),
    Internal(String),
}

impl From<OptimizerError> for ApiError {
    fn from(err: OptimizerError) -> Self {
        ApiError::Optimizer(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, code) = match self {
            ApiError::Optimizer(err) => {
                let status = match err {
                    OptimizerError::NoProvidersAvailable | OptimizerError::RoundCancelled => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    OptimizerError::InsufficientHistory { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    OptimizerError::InvalidEndpoint { .. }
                    | OptimizerError::NoEndpoints
                    | OptimizerError::HttpClient(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string(), err.code().to_string())
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, message, "bad_request".to_string())
            }
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                message,
                "internal_error".to_string(),
            ),
        };

        if status.is_server_error() {
            warn!(status = status.as_u16(), code = %code, error = %error, "Request failed");
        }

        (status, Json(ErrorResponse { error, code })).into_response()
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving recommendations
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(format!("failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoundResponse {
    pub available: usize,
    pub metrics: Vec<ProviderMetric>,
}

/// Run one probe round and return the per-provider metrics
async fn run_round(State(state): State<Arc<AppState>>) -> Result<Json<RoundResponse>, ApiError> {
    let metrics = state.optimizer.probe_round().await?;
    let available = metrics.iter().filter(|m| m.is_available()).count();

    state
        .health_registry
        .update(
            components::PROBE,
            ComponentHealth::from_round(available, metrics.len()),
        )
        .await;

    Ok(Json(RoundResponse { available, metrics }))
}

async fn recommendation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Recommendation>, ApiError> {
    Ok(Json(state.optimizer.optimal_provider().await?))
}

async fn trends(State(state): State<Arc<AppState>>) -> Result<Json<TrendAnalysis>, ApiError> {
    Ok(Json(state.optimizer.cost_trend_analysis().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub provider: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub stats: HistoryStats,
    pub metrics: Vec<ProviderMetric>,
}

async fn history(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(params) = params?;
    let provider = params
        .provider
        .as_deref()
        .map(str::parse::<Provider>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    let metrics = state.optimizer.history(provider, limit).await;
    let stats = state.optimizer.history_stats().await;

    Ok(Json(HistoryResponse { stats, metrics }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

async fn query(
    State(state): State<Arc<AppState>>,
    request: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = request?;
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    Ok(Json(state.optimizer.answer_query(&request.query).await?))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/rounds", post(run_round))
        .route("/api/v1/recommendation", get(recommendation))
        .route("/api/v1/trends", get(trends))
        .route("/api/v1/history", get(history))
        .route("/api/v1/query", post(query))
        .with_state(state)
}

/// Start the API server and stop accepting connections on shutdown
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    info!("API server stopped");
    Ok(())
}
