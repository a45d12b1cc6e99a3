//! End-of-test summary export as JSON

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::collector::{LatencyStats, MetricsCollector};
use super::types::TestMetrics;
use crate::config::LoadTestConfig;
use crate::error::LoadTestError;

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub aborted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<LoadTestConfig>,
    pub failed_checks: usize,
    pub request_latency_ms: LatencyStats,
    pub metrics: TestMetrics,
}

impl Summary {
    pub fn from_collector(
        collector: &MetricsCollector,
        config: Option<&LoadTestConfig>,
        aborted: bool,
    ) -> Self {
        let metrics = collector.get_snapshot();
        Self {
            finished_at: Utc::now(),
            duration_secs: collector.elapsed().as_secs_f64(),
            aborted,
            config: config.cloned(),
            failed_checks: metrics.failed_checks(),
            request_latency_ms: collector.get_request_latency_percentiles(),
            metrics,
        }
    }

    pub fn to_json(&self) -> Result<String, LoadTestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), LoadTestError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| LoadTestError::SummaryExport {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Summary written to {}", path.display());
        Ok(())
    }
}
