//! Error types for the load test driver.
//!
//! Nothing on the request path is an error here: failed requests and
//! failed checks are metrics. These types cover setup and I/O around a run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling a [`LoadTestConfig`](crate::config::LoadTestConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML or has unknown keys
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Stage syntax is `<duration>:<target>`
    #[error("Invalid stage '{0}': expected <duration>:<target>, e.g. 30s:10")]
    InvalidStage(String),

    #[error("Invalid todo identifier '{0}': expected a UUID")]
    InvalidId(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Top-level error for running the driver or the stub backend.
#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Failed to write summary to {path}: {source}")]
    SummaryExport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Backend server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type Result<T, E = LoadTestError> = std::result::Result<T, E>;
