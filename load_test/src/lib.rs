//! Ramping virtual-user load test for the todo HTTP API.
//!
//! Virtual users walk a fixed list of todo identifiers, issue
//! `GET /todo/{id}` for each, check the status code (and the returned `id`
//! on success) and pause between requests. The number of active virtual
//! users follows a [`schedule::Schedule`] of ramp stages.

pub mod backend;
pub mod checks;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod runner;
pub mod scenarios;
pub mod schedule;

pub use error::{ConfigError, LoadTestError};
