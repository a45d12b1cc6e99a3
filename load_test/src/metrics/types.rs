//! Metric types

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestMetrics {
    pub started: usize,
    /// Got an HTTP response, whatever the status
    pub completed: usize,
    /// Network-level failure, no response
    pub failed: usize,
    /// Abandoned mid-flight because the VU was interrupted
    pub interrupted: usize,
    pub in_flight: usize,
    pub status_codes: BTreeMap<u16, usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IterationMetrics {
    pub completed: usize,
    pub interrupted: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VuMetrics {
    pub active: usize,
    pub target: usize,
    pub peak: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckStats {
    pub passes: usize,
    pub fails: usize,
}

impl CheckStats {
    pub fn total(&self) -> usize {
        self.passes + self.fails
    }

    /// Percentage of passes, 100 when nothing was checked
    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            100.0
        } else {
            self.passes as f64 / self.total() as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemMetrics {
    pub cpu_usage: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TestMetrics {
    pub requests: RequestMetrics,
    pub iterations: IterationMetrics,
    pub vus: VuMetrics,
    pub checks: BTreeMap<String, CheckStats>,
    pub system: SystemMetrics,
}

impl TestMetrics {
    pub fn failed_checks(&self) -> usize {
        self.checks.values().map(|stats| stats.fails).sum()
    }

    pub fn check(&self, name: &str) -> CheckStats {
        self.checks.get(name).copied().unwrap_or_default()
    }
}
