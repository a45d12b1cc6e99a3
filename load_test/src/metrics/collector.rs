//! Metrics collector - thread-safe collection with latency tracking

use super::types::TestMetrics;
use hdrhistogram::Histogram;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

#[derive(Clone)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<TestMetrics>>,
    request_latencies: Arc<RwLock<Histogram<u64>>>,
    system: Arc<RwLock<System>>,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        // Create histogram with 3 significant digits of precision
        let request_hist = Histogram::new(3).expect("Failed to create request histogram");

        // Initialize system monitor
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );

        Self {
            metrics: Arc::new(RwLock::new(TestMetrics::default())),
            request_latencies: Arc::new(RwLock::new(request_hist)),
            system: Arc::new(RwLock::new(system)),
            start_time: Instant::now(),
        }
    }

    pub fn request_started(&self) {
        let mut metrics = self.metrics.write();
        metrics.requests.started += 1;
        metrics.requests.in_flight += 1;
    }

    pub fn request_completed(&self, status: u16, duration_ms: u64) {
        let mut metrics = self.metrics.write();
        metrics.requests.completed += 1;
        metrics.requests.in_flight = metrics.requests.in_flight.saturating_sub(1);
        *metrics.requests.status_codes.entry(status).or_default() += 1;
        drop(metrics);

        self.record_latency(duration_ms);
    }

    pub fn request_failed(&self, duration_ms: u64) {
        let mut metrics = self.metrics.write();
        metrics.requests.failed += 1;
        metrics.requests.in_flight = metrics.requests.in_flight.saturating_sub(1);
        drop(metrics);

        // Still record latency for failed requests
        self.record_latency(duration_ms);
    }

    /// Request dropped because its VU was interrupted; no latency sample
    pub fn request_interrupted(&self) {
        let mut metrics = self.metrics.write();
        metrics.requests.interrupted += 1;
        metrics.requests.in_flight = metrics.requests.in_flight.saturating_sub(1);
    }

    pub fn record_check(&self, name: &str, passed: bool) {
        let mut metrics = self.metrics.write();
        let stats = metrics.checks.entry(name.to_string()).or_default();
        if passed {
            stats.passes += 1;
        } else {
            stats.fails += 1;
        }
    }

    pub fn iteration_completed(&self) {
        self.metrics.write().iterations.completed += 1;
    }

    pub fn iteration_interrupted(&self) {
        self.metrics.write().iterations.interrupted += 1;
    }

    pub fn vu_started(&self) {
        let mut metrics = self.metrics.write();
        metrics.vus.active += 1;
        metrics.vus.peak = metrics.vus.peak.max(metrics.vus.active);
    }

    pub fn vu_stopped(&self) {
        let mut metrics = self.metrics.write();
        metrics.vus.active = metrics.vus.active.saturating_sub(1);
    }

    pub fn set_vu_target(&self, target: usize) {
        self.metrics.write().vus.target = target;
    }

    fn record_latency(&self, duration_ms: u64) {
        let _ = self.request_latencies.write().record(duration_ms);
    }

    /// Update system metrics (CPU, memory)
    pub fn update_system_metrics(&self) {
        let mut system = self.system.write();
        system.refresh_cpu_all();
        system.refresh_memory();

        let mut metrics = self.metrics.write();

        // Get global CPU usage
        metrics.system.cpu_usage = system.global_cpu_usage();

        // Get memory usage
        metrics.system.memory_used_mb = system.used_memory() / 1024 / 1024;
        metrics.system.memory_total_mb = system.total_memory() / 1024 / 1024;
    }

    pub fn get_snapshot(&self) -> TestMetrics {
        self.metrics.read().clone()
    }

    pub fn get_request_latency_percentiles(&self) -> LatencyStats {
        let hist = self.request_latencies.read();
        LatencyStats {
            min: hist.min(),
            p50: hist.value_at_quantile(0.50),
            p90: hist.value_at_quantile(0.90),
            p95: hist.value_at_quantile(0.95),
            p99: hist.value_at_quantile(0.99),
            max: hist.max(),
            mean: hist.mean(),
            count: hist.len(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyStats {
    pub min: u64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub max: u64,
    pub mean: f64,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks;

    #[test]
    fn test_request_lifecycle_counters() {
        let collector = MetricsCollector::new();

        collector.request_started();
        collector.request_started();
        collector.request_started();
        assert_eq!(collector.get_snapshot().requests.in_flight, 3);

        collector.request_completed(200, 12);
        collector.request_completed(404, 8);
        collector.request_failed(30);

        let snapshot = collector.get_snapshot();
        assert_eq!(snapshot.requests.started, 3);
        assert_eq!(snapshot.requests.completed, 2);
        assert_eq!(snapshot.requests.failed, 1);
        assert_eq!(snapshot.requests.in_flight, 0);
        assert_eq!(snapshot.requests.status_codes.get(&200), Some(&1));
        assert_eq!(snapshot.requests.status_codes.get(&404), Some(&1));

        let latency = collector.get_request_latency_percentiles();
        assert_eq!(latency.count, 3);
        assert_eq!(latency.min, 8);
        assert!(latency.max >= 30);
    }

    #[test]
    fn test_interrupted_request_leaves_no_latency_sample() {
        let collector = MetricsCollector::new();
        collector.request_started();
        collector.request_interrupted();

        let snapshot = collector.get_snapshot();
        assert_eq!(snapshot.requests.in_flight, 0);
        assert_eq!(snapshot.requests.interrupted, 1);
        assert_eq!(collector.get_request_latency_percentiles().count, 0);
    }

    #[test]
    fn test_checks_are_counted_per_name() {
        let collector = MetricsCollector::new();
        collector.record_check(checks::STATUS_200_OR_404, true);
        collector.record_check(checks::STATUS_200_OR_404, false);
        collector.record_check(checks::ID_MATCHES, true);

        let snapshot = collector.get_snapshot();
        assert_eq!(
            snapshot.check(checks::STATUS_200_OR_404),
            crate::metrics::types::CheckStats { passes: 1, fails: 1 }
        );
        assert_eq!(snapshot.check(checks::ID_MATCHES).passes, 1);
        assert_eq!(snapshot.failed_checks(), 1);
        assert_eq!(snapshot.check(checks::STATUS_200_OR_404).pass_rate(), 50.0);
    }

    #[test]
    fn test_vu_gauge_tracks_peak() {
        let collector = MetricsCollector::new();
        collector.vu_started();
        collector.vu_started();
        collector.vu_stopped();
        collector.vu_started();
        collector.vu_stopped();
        collector.vu_stopped();
        collector.vu_stopped();

        let vus = collector.get_snapshot().vus;
        assert_eq!(vus.active, 0);
        assert_eq!(vus.peak, 2);
    }
}
