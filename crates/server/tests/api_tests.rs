//! Integration tests for the optimizer API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use fiso_lib::{
    health::{components, HealthRegistry},
    probe::{async_trait, HealthProbe},
    CostOptimizer, OptimizerConfig, ProbeFailure, Provider, ProviderEndpoint,
};
use fiso_server::api::{create_router, AppState};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

/// Probe that answers immediately, failing for the configured URLs
struct StaticProbe {
    down: HashSet<String>,
}

#[async_trait]
impl HealthProbe for StaticProbe {
    async fn check(&self, url: &str) -> Result<(), ProbeFailure> {
        if self.down.contains(url) {
            Err(ProbeFailure::Status(503))
        } else {
            Ok(())
        }
    }
}

fn endpoints() -> Vec<ProviderEndpoint> {
    vec![
        ProviderEndpoint::new(Provider::Aws, "http://aws.test/health", "us-east-1", 0.0000002, 99.95),
        ProviderEndpoint::new(Provider::Azure, "http://azure.test/health", "eastus", 0.0000002, 99.95),
        ProviderEndpoint::new(Provider::Gcp, "http://gcp.test/health", "us-central1", 0.0004, 99.9),
    ]
}

async fn setup_test_app(down: &[&str]) -> (Router, Arc<AppState>) {
    let probe = Arc::new(StaticProbe {
        down: down.iter().map(|s| s.to_string()).collect(),
    });
    let optimizer = Arc::new(
        CostOptimizer::with_probe(probe, endpoints(), OptimizerConfig::default()).unwrap(),
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::PROBE).await;
    health_registry.register(components::HISTORY).await;

    let state = Arc::new(AppState::new(health_registry, optimizer));
    let router = create_router(state.clone());

    (router, state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_healthz_includes_component_details() {
    let (app, _state) = setup_test_app(&[]).await;

    let (status, health) = send(app, get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["probe"].is_object());
    assert!(health["components"]["history"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app(&[]).await;

    state
        .health_registry
        .set_unhealthy(components::PROBE, "No providers reachable")
        .await;

    let (status, health) = send(app, get("/healthz")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_follows_ready_flag() {
    let (app, state) = setup_test_app(&[]).await;

    let (status, readiness) = send(app.clone(), get("/readyz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;

    let (status, readiness) = send(app, get("/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_round_returns_metrics_and_updates_health() {
    let (app, state) = setup_test_app(&["http://gcp.test/health"]).await;

    let (status, round) = send(app, post_json("/api/v1/rounds", serde_json::json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(round["available"], 2);
    let metrics = round["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 3);
    assert_eq!(metrics[0]["provider"], "aws");
    assert_eq!(metrics[2]["success_rate"], 0.0);
    assert!(metrics[2]["response_time_ms"].is_null());
    assert_eq!(metrics[2]["failure"]["kind"], "status");

    let health = state.health_registry.health().await;
    assert_eq!(health.status, fiso_lib::ComponentStatus::Degraded);
}

#[tokio::test]
async fn test_recommendation_picks_reachable_provider() {
    let (app, _state) = setup_test_app(&["http://aws.test/health"]).await;

    let (status, recommendation) = send(app, get("/api/v1/recommendation")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(recommendation["provider"], "azure");
    assert_eq!(recommendation["all_options"].as_array().unwrap().len(), 2);
    assert!(recommendation["reasoning"]
        .as_str()
        .unwrap()
        .starts_with("Azure (eastus) selected"));
}

#[tokio::test]
async fn test_recommendation_returns_503_when_all_down() {
    let (app, _state) = setup_test_app(&[
        "http://aws.test/health",
        "http://azure.test/health",
        "http://gcp.test/health",
    ])
    .await;

    let (status, error) = send(app, get("/api/v1/recommendation")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error["code"], "no_providers_available");
}

#[tokio::test]
async fn test_trends_require_history() {
    let (app, _state) = setup_test_app(&[]).await;

    let (status, error) = send(app.clone(), get("/api/v1/trends")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "insufficient_history");

    for _ in 0..4 {
        let (status, _) = send(app.clone(), post_json("/api/v1/rounds", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, trends) = send(app, get("/api/v1/trends")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trends["total_samples"], 12);
    assert!(trends["providers"]["gcp"].is_object());
}

#[tokio::test]
async fn test_history_filters_by_provider() {
    let (app, _state) = setup_test_app(&[]).await;

    for _ in 0..3 {
        send(app.clone(), post_json("/api/v1/rounds", serde_json::json!({}))).await;
    }

    let (status, history) = send(app.clone(), get("/api/v1/history?provider=azure&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["stats"]["entries"], 9);
    let metrics = history["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 2);
    assert!(metrics.iter().all(|m| m["provider"] == "azure"));

    let (status, error) = send(app, get("/api/v1/history?provider=oracle")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "bad_request");
}

#[tokio::test]
async fn test_query_answers_question() {
    let (app, _state) = setup_test_app(&[]).await;

    let (status, response) = send(
        app.clone(),
        post_json("/api/v1/query", serde_json::json!({ "query": "which provider is cheapest?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["intent"], "cheapest");
    assert!(!response["answer"].as_str().unwrap().is_empty());

    let (status, _) = send(
        app,
        post_json("/api/v1/query", serde_json::json!({ "query": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app(&["http://azure.test/health"]).await;

    send(app.clone(), post_json("/api/v1/rounds", serde_json::json!({}))).await;
    send(app.clone(), get("/api/v1/recommendation")).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("fiso_probe_latency_seconds_bucket"));
    assert!(metrics_text.contains("fiso_probe_failures_total"));
    assert!(metrics_text.contains("fiso_probe_rounds_completed_total"));
    assert!(metrics_text.contains("fiso_efficiency_score"));
    assert!(metrics_text.contains("fiso_recommendations_generated_total"));
}

#[tokio::test]
async fn test_malformed_query_body_is_json_bad_request() {
    let (app, _state) = setup_test_app(&[]).await;

    let (status, error) = send(
        app.clone(),
        post_json("/api/v1/query", serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "bad_request");
    assert!(error["error"].is_string());

    let not_json = Request::builder()
        .method("POST")
        .uri("/api/v1/query")
        .header("content-type", "application/json")
        .body(Body::from("{query"))
        .unwrap();
    let (status, error) = send(app, not_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "bad_request");
}

#[tokio::test]
async fn test_invalid_history_params_are_json_bad_request() {
    let (app, _state) = setup_test_app(&[]).await;

    let (status, error) = send(app, get("/api/v1/history?limit=abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "bad_request");
    assert!(error["error"].is_string());
}
