//! Multi-cloud cost optimizer library
//!
//! This crate provides the core functionality for:
//! - Concurrent health probing of cloud provider endpoints
//! - Weighted efficiency scoring and provider recommendation
//! - Bounded measurement history and cost trend analysis
//! - Natural-language query classification
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod history;
pub mod models;
pub mod observability;
pub mod optimizer;
pub mod probe;
pub mod query;
pub mod scoring;

pub use error::{OptimizerError, ProbeFailure};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{OptimizerMetrics, StructuredLogger};
pub use optimizer::{CostOptimizer, OptimizerConfig, ProbeLoop, QueryResponse};
