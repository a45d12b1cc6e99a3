//! HTTP client for the todo API

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{self, LoadTestConfig};
use crate::error::LoadTestError;

const USER_AGENT: &str = concat!("todo-load-test/", env!("CARGO_PKG_VERSION"));

/// Network-level failure. HTTP statuses, including 5xx, are not errors at
/// this layer.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl RequestError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            RequestError::Timeout { url }
        } else if source.is_connect() {
            RequestError::Connect { url, source }
        } else {
            RequestError::Transport { url, source }
        }
    }
}

/// Response record for a single request
#[derive(Debug, Clone)]
pub struct TodoResponse {
    pub status: u16,
    pub body: String,
    /// Send until the full body was read
    pub elapsed: Duration,
}

/// Cheap to clone: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct TodoClient {
    http: reqwest::Client,
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, LoadTestError> {
        config::parse_base_url(base_url)?;

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(LoadTestError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &LoadTestConfig) -> Result<Self, LoadTestError> {
        Self::new(&config.base_url, config.request_timeout)
    }

    pub fn todo_url(&self, id: &str) -> String {
        format!("{}/todo/{}", self.base_url, id)
    }

    /// `GET {base_url}/todo/{id}`, reading the full body
    pub async fn get_todo(&self, id: &str) -> Result<TodoResponse, RequestError> {
        let url = self.todo_url(id);
        let start = Instant::now();

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RequestError::from_reqwest(&url, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RequestError::from_reqwest(&url, e))?;

        tracing::debug!(%url, status, "GET completed");

        Ok(TodoResponse {
            status,
            body,
            elapsed: start.elapsed(),
        })
    }
}
