//! Provider health probing
//!
//! This module provides the transport used to check a provider endpoint and
//! the round runner that probes every configured provider concurrently under
//! a single deadline.

mod http;
mod round;

pub use http::HttpProbe;
pub use round::{ProbeConfig, ProviderProbe, DEFAULT_DEADLINE_GRACE, DEFAULT_PROBE_TIMEOUT};

use crate::error::ProbeFailure;

pub use async_trait::async_trait;

/// Trait for health-check transports
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Check one endpoint. `Ok` means the endpoint answered HTTP 200.
    async fn check(&self, url: &str) -> Result<(), ProbeFailure>;
}
