//! Load test configuration
//!
//! Layers, lowest precedence first: built-in defaults, the named profile,
//! a YAML file, then environment variables and CLI flags (both resolved by
//! clap in [`crate::cli`]).

pub mod profiles;

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::schedule::{Schedule, Stage};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Identifiers requested, in this order, by every iteration
pub const DEFAULT_TODO_IDS: [&str; 9] = [
    "7f9cd9f9-6b9e-46f1-a097-5956498ca85e",
    "2cebc463-bb73-4029-ba5d-5719ebfe42ea",
    "336231ee-82f5-4e29-9d88-4198821f635e",
    "5228fc5b-b453-48b3-bc08-c67fef025dd4",
    "761fb35a-a9c4-4dbf-827a-ac4676a17d8c",
    "ed7acaaa-8609-4092-8412-8ea6cbe52349",
    "d0830367-5025-477d-87ca-7fd804129a84",
    "d0fc3a3b-b0a5-4d47-81c3-eea29adb6d62",
    "e9a14c52-304f-497a-b5ce-3110fc425f39",
];

pub const DEFAULT_THINK_TIME: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);
pub const DEFAULT_GRACEFUL_RAMP_DOWN: Duration = Duration::from_secs(30);
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 5;
/// Upper bound on any stage target or `start_vus`
pub const MAX_VUS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadTestConfig {
    pub base_url: String,
    pub schedule: Schedule,
    pub ids: Vec<String>,
    /// Pause after every request
    #[serde(with = "humantime_serde")]
    pub think_time: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// How long running iterations may continue once the schedule has ended
    #[serde(with = "humantime_serde")]
    pub graceful_stop: Duration,
    /// How long a retired VU may finish its iteration during ramp-down
    #[serde(with = "humantime_serde")]
    pub graceful_ramp_down: Duration,
    /// Live report interval in seconds, 0 disables it
    pub report_interval: u64,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            schedule: profiles::standard_profile(),
            ids: DEFAULT_TODO_IDS.iter().map(|id| id.to_string()).collect(),
            think_time: DEFAULT_THINK_TIME,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            graceful_stop: DEFAULT_GRACEFUL_STOP,
            graceful_ramp_down: DEFAULT_GRACEFUL_RAMP_DOWN,
            report_interval: DEFAULT_REPORT_INTERVAL_SECS,
        }
    }
}

impl LoadTestConfig {
    /// Defaults with the schedule of the named profile
    pub fn from_profile(profile: &str) -> Self {
        Self {
            schedule: profiles::get_profile(profile),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(&self.base_url)?;

        if self.schedule.stages.is_empty() {
            return Err(ConfigError::Validation(
                "schedule must have at least one stage".to_string(),
            ));
        }
        if self.schedule.max_vus() == 0 {
            return Err(ConfigError::Validation(
                "schedule never starts a virtual user".to_string(),
            ));
        }
        if self.schedule.max_vus() > MAX_VUS {
            return Err(ConfigError::Validation(format!(
                "schedule asks for {} virtual users, the limit is {}",
                self.schedule.max_vus(),
                MAX_VUS
            )));
        }
        if self.ids.is_empty() {
            return Err(ConfigError::Validation(
                "identifier list must not be empty".to_string(),
            ));
        }
        for id in &self.ids {
            validate_id(id)?;
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse and check a base URL. Only http and https are accepted.
pub fn parse_base_url(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidBaseUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ConfigError::InvalidBaseUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

pub fn validate_id(id: &str) -> Result<(), ConfigError> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidId(id.to_string()))
}

/// Partial configuration read from a YAML file.
///
/// ```yaml
/// base_url: http://localhost:8080
/// start_vus: 0
/// stages:
///   - { duration: 30s, target: 10 }
///   - { duration: 1m, target: 10 }
///   - { duration: 30s, target: 0 }
/// think_time: 1s
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub start_vus: Option<usize>,
    pub stages: Option<Vec<Stage>>,
    pub ids: Option<Vec<String>>,
    #[serde(default, with = "humantime_serde")]
    pub think_time: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub graceful_stop: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub graceful_ramp_down: Option<Duration>,
    pub report_interval: Option<u64>,
}

impl ConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay every field present in the file onto `config`
    pub fn apply_to(self, config: &mut LoadTestConfig) {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(start_vus) = self.start_vus {
            config.schedule.start_vus = start_vus;
        }
        if let Some(stages) = self.stages {
            config.schedule.stages = stages;
        }
        if let Some(ids) = self.ids {
            config.ids = ids;
        }
        if let Some(think_time) = self.think_time {
            config.think_time = think_time;
        }
        if let Some(request_timeout) = self.request_timeout {
            config.request_timeout = request_timeout;
        }
        if let Some(graceful_stop) = self.graceful_stop {
            config.graceful_stop = graceful_stop;
        }
        if let Some(graceful_ramp_down) = self.graceful_ramp_down {
            config.graceful_ramp_down = graceful_ramp_down;
        }
        if let Some(report_interval) = self.report_interval {
            config.report_interval = report_interval;
        }
    }
}
