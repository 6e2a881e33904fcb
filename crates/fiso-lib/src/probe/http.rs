//! HTTP health-check transport

use super::{async_trait, HealthProbe};
use crate::error::{OptimizerError, ProbeFailure, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Issues a single GET per check; only HTTP 200 counts as healthy
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("fiso-probe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OptimizerError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn check(&self, url: &str) -> std::result::Result<(), ProbeFailure> {
        let response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status();

        debug!(url = %url, status = status.as_u16(), "Health check answered");

        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(ProbeFailure::Status(status.as_u16()))
        }
    }
}

fn classify(error: reqwest::Error) -> ProbeFailure {
    if error.is_timeout() {
        ProbeFailure::Timeout
    } else if error.is_connect() {
        ProbeFailure::Connect(error.to_string())
    } else {
        ProbeFailure::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ok_status_is_healthy() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .create_async()
            .await;

        let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();
        let result = probe.check(&format!("{}/health", server.url())).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_200_is_status_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(503)
            .create_async()
            .await;

        let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();
        let result = probe.check(&format!("{}/health", server.url())).await;

        assert_eq!(result, Err(ProbeFailure::Status(503)));
    }

    #[tokio::test]
    async fn test_other_success_codes_are_not_healthy() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(204)
            .create_async()
            .await;

        let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();
        let result = probe.check(&format!("{}/health", server.url())).await;

        assert_eq!(result, Err(ProbeFailure::Status(204)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_failure() {
        let probe = HttpProbe::new(Duration::from_secs(2)).unwrap();
        let result = probe.check("http://127.0.0.1:1/health").await;

        assert!(matches!(result, Err(ProbeFailure::Connect(_))));
    }
}
