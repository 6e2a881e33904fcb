//! Server configuration

use anyhow::{Context, Result};
use fiso_lib::{
    history::{DEFAULT_HISTORY_CAPACITY, MIN_TREND_SAMPLES},
    models::validate_endpoints,
    probe::{ProbeConfig, DEFAULT_DEADLINE_GRACE},
    OptimizerConfig, ProviderEndpoint,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an optional config file (toml, json or yaml)
pub const CONFIG_FILE_ENV: &str = "FISO_CONFIG_FILE";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name attached to log events
    #[serde(default = "default_instance")]
    pub instance: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Per-probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Background probe interval in seconds (0 disables the loop)
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    /// Retained metrics across all providers
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Retained metrics required for trend analysis
    #[serde(default = "default_min_trend_samples")]
    pub min_trend_samples: usize,

    /// Providers to probe
    #[serde(default = "ProviderEndpoint::defaults")]
    pub providers: Vec<ProviderEndpoint>,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "fiso".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_probe_interval() -> u64 {
    60
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_min_trend_samples() -> usize {
    MIN_TREND_SAMPLES
}

impl ServerConfig {
    /// Load configuration from the environment and the optional config file
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::load_from(file.as_deref().map(Path::new))
    }

    /// Load configuration, layering `FISO_*` environment variables over `file`
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("FISO").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        let server_config: ServerConfig = config
            .try_deserialize()
            .context("Failed to parse configuration")?;

        validate_endpoints(&server_config.providers).context("Invalid provider configuration")?;

        Ok(server_config)
    }

    pub fn probe_interval(&self) -> Option<Duration> {
        match self.probe_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            probe: ProbeConfig {
                timeout: Duration::from_secs(self.probe_timeout_secs.max(1)),
                deadline_grace: DEFAULT_DEADLINE_GRACE,
            },
            history_capacity: self.history_capacity,
            min_trend_samples: self.min_trend_samples,
            instance: self.instance.clone(),
        }
    }
}
