use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigFile, LoadTestConfig, DEFAULT_TODO_IDS};
use crate::error::ConfigError;
use crate::schedule::Stage;

/// Todo API Load Testing Tool
#[derive(Parser, Debug)]
#[command(name = "todo-load-test")]
#[command(about = "Ramping virtual-user load test for the todo HTTP API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Run the ramping load test (runs until the schedule ends or Ctrl+C)
    Run(RunArgs),

    /// Run a single iteration with one virtual user; fails on any failed check
    Smoke(SmokeArgs),

    /// Serve an in-memory todo API to test against (runs until Ctrl+C)
    Backend(BackendArgs),
}

/// Where to send requests and what to request
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// YAML configuration file
    #[arg(long, env = "TODO_LOAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the todo API
    #[arg(long, env = "TODO_BASE_URL")]
    pub base_url: Option<String>,

    /// Todo identifier to request (repeatable, replaces the built-in list)
    #[arg(long = "id", value_name = "UUID")]
    pub ids: Vec<String>,

    /// Pause after each request, e.g. 1s or 250ms
    #[arg(long, value_parser = humantime::parse_duration)]
    pub think_time: Option<Duration>,

    /// Per-request timeout, e.g. 60s
    #[arg(long, value_parser = humantime::parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Write the final metrics as JSON to this file
    #[arg(long)]
    pub summary_export: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Ramp schedule profile: standard, smoke, stress
    #[arg(long, default_value = "standard", env = "TODO_LOAD_PROFILE")]
    pub profile: String,

    /// Ramp stage as <duration>:<target>, e.g. 30s:10 (repeatable, replaces the profile stages)
    #[arg(long = "stage", value_name = "DURATION:TARGET")]
    pub stages: Vec<Stage>,

    /// VUs at the start of the first stage
    #[arg(long)]
    pub start_vus: Option<usize>,

    /// Time running iterations get to finish once the schedule ends
    #[arg(long, value_parser = humantime::parse_duration)]
    pub graceful_stop: Option<Duration>,

    /// Time a VU removed by ramp-down gets to finish its iteration
    #[arg(long, value_parser = humantime::parse_duration)]
    pub graceful_ramp_down: Option<Duration>,

    /// Live metrics interval in seconds (0 disables the live view)
    #[arg(long)]
    pub report_interval: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct SmokeArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080", env = "TODO_BACKEND_LISTEN")]
    pub listen: SocketAddr,

    /// Todo identifier to seed (repeatable, defaults to the built-in list)
    #[arg(long = "id", value_name = "UUID")]
    pub ids: Vec<String>,

    /// Identifier to leave out of the seed so it answers 404 (repeatable)
    #[arg(long = "absent", value_name = "UUID")]
    pub absent: Vec<String>,

    /// Latency added to every response, e.g. 20ms
    #[arg(long, value_parser = humantime::parse_duration)]
    pub latency: Option<Duration>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl TargetArgs {
    /// Overlay the config file, then these flags, onto `config`
    fn apply(&self, config: &mut LoadTestConfig) -> Result<(), ConfigError> {
        if let Some(path) = &self.config {
            ConfigFile::load(path)?.apply_to(config);
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if !self.ids.is_empty() {
            config.ids = self.ids.clone();
        }
        if let Some(think_time) = self.think_time {
            config.think_time = think_time;
        }
        if let Some(request_timeout) = self.request_timeout {
            config.request_timeout = request_timeout;
        }
        Ok(())
    }
}

impl RunArgs {
    pub fn resolve(&self) -> Result<LoadTestConfig, ConfigError> {
        let mut config = LoadTestConfig::from_profile(&self.profile);
        self.target.apply(&mut config)?;

        if !self.stages.is_empty() {
            config.schedule.stages = self.stages.clone();
        }
        if let Some(start_vus) = self.start_vus {
            config.schedule.start_vus = start_vus;
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

        config.validate()?;
        Ok(config)
    }
}

impl SmokeArgs {
    pub fn resolve(&self) -> Result<LoadTestConfig, ConfigError> {
        let mut config = LoadTestConfig::from_profile("smoke");
        self.target.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}

impl BackendArgs {
    pub fn seed_ids(&self) -> Vec<String> {
        if self.ids.is_empty() {
            DEFAULT_TODO_IDS.iter().map(|id| id.to_string()).collect()
        } else {
            self.ids.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn run_args(args: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.mode {
            Mode::Run(args) => args,
            other => panic!("expected run mode, got {:?}", other),
        }
    }

    #[test]
    fn test_run_defaults() {
        let config = run_args(&["todo-load-test", "run"]).resolve().unwrap();
        assert_eq!(config, LoadTestConfig::default());
    }

    #[test]
    fn test_run_flags_override() {
        let config = run_args(&[
            "todo-load-test",
            "run",
            "--base-url",
            "http://127.0.0.1:9999",
            "--stage",
            "5s:3",
            "--stage",
            "5s:0",
            "--id",
            "2cebc463-bb73-4029-ba5d-5719ebfe42ea",
            "--think-time",
            "100ms",
            "--report-interval",
            "0",
        ])
        .resolve()
        .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.schedule.stages.len(), 2);
        assert_eq!(config.schedule.max_vus(), 3);
        assert_eq!(config.ids, vec!["2cebc463-bb73-4029-ba5d-5719ebfe42ea"]);
        assert_eq!(config.think_time, Duration::from_millis(100));
        assert_eq!(config.report_interval, 0);
    }

    #[test]
    fn test_flags_beat_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url: http://from-file:8080\nthink_time: 2s\nstages:\n  - {{ duration: 1s, target: 1 }}"
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let config = run_args(&[
            "todo-load-test",
            "run",
            "--config",
            path,
            "--think-time",
            "10ms",
        ])
        .resolve()
        .unwrap();

        assert_eq!(config.base_url, "http://from-file:8080");
        assert_eq!(config.think_time, Duration::from_millis(10));
        assert_eq!(config.schedule.total_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_stage_is_rejected_by_clap() {
        assert!(Cli::try_parse_from(["todo-load-test", "run", "--stage", "soon:10"]).is_err());
    }

    #[test]
    fn test_invalid_id_fails_resolution() {
        let err = run_args(&["todo-load-test", "run", "--id", "not-a-uuid"])
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidId(_)));
    }

    #[test]
    fn test_backend_defaults() {
        let cli = Cli::try_parse_from(["todo-load-test", "backend", "--absent", "x"]).unwrap();
        let Mode::Backend(args) = cli.mode else {
            panic!("expected backend mode");
        };
        assert_eq!(args.listen, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(args.seed_ids().len(), 9);
        assert_eq!(args.absent, vec!["x"]);
    }
}
