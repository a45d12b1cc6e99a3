//! Console reporter for metrics with real-time updates

use super::collector::{LatencyStats, MetricsCollector};
use super::types::TestMetrics;
use std::io::{self, Write};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Start periodic metrics reporting (every N seconds) until `stop` fires
pub async fn start_periodic_reporter(
    collector: MetricsCollector,
    interval_secs: u64,
    stop: CancellationToken,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the first tick completes immediately, nothing to show yet
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Update system metrics before printing
        collector.update_system_metrics();

        print_live_metrics(&collector);
    }
}

/// Print live metrics (clears screen and updates in place)
pub fn print_live_metrics(collector: &MetricsCollector) {
    // Clear screen and move cursor to top
    print!("\x1B[2J\x1B[1;1H");

    let metrics = collector.get_snapshot();
    let elapsed = collector.elapsed_seconds();
    let latency = collector.get_request_latency_percentiles();

    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║               Todo API Load Test - Live Metrics               ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    println!(
        "\n⏱️  Elapsed Time: {:02}:{:02}:{:02}",
        elapsed / 3600,
        (elapsed % 3600) / 60,
        elapsed % 60
    );

    // Virtual users
    println!("\n┌─ VIRTUAL USERS ─────────────────────────────────────────────┐");
    println!(
        "│  Active:       {:>8}    Target:     {:>8}              │",
        metrics.vus.active, metrics.vus.target
    );
    println!(
        "│  Iterations:   {:>8}    Interrupted:{:>8}              │",
        metrics.iterations.completed, metrics.iterations.interrupted
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    // Requests
    println!("\n┌─ REQUESTS ──────────────────────────────────────────────────┐");
    println!(
        "│  Started:      {:>8}    In-Flight:  {:>8}              │",
        metrics.requests.started, metrics.requests.in_flight
    );
    println!(
        "│  Completed:    {:>8}    Failed:     {:>8}              │",
        metrics.requests.completed, metrics.requests.failed
    );
    if elapsed > 0 {
        let throughput = metrics.requests.completed as f64 / elapsed as f64;
        println!(
            "│  Throughput:   {:>7.2}/sec                                  │",
            throughput
        );
    }
    println!("└─────────────────────────────────────────────────────────────┘");

    if latency.count > 0 {
        println!("\n┌─ REQUEST LATENCY (ms) ──────────────────────────────────────┐");
        println!(
            "│  Min: {:>6}  P50: {:>6}  P95: {:>6}  P99: {:>6}  Max: {:>6}│",
            latency.min, latency.p50, latency.p95, latency.p99, latency.max
        );
        println!(
            "│  Mean: {:>8.2} ms    Count: {:>10}                    │",
            latency.mean, latency.count
        );
        println!("└─────────────────────────────────────────────────────────────┘");
    }

    if !metrics.checks.is_empty() {
        println!("\n┌─ CHECKS ────────────────────────────────────────────────────┐");
        for (name, stats) in &metrics.checks {
            println!(
                "│  {:<34} {:>7} ✓ {:>7} ✗         │",
                name, stats.passes, stats.fails
            );
        }
        println!("└─────────────────────────────────────────────────────────────┘");
    }

    // System metrics
    println!("\n┌─ SYSTEM ────────────────────────────────────────────────────┐");
    println!(
        "│  CPU Usage:    {:>6.1}%    Memory: {:>6} / {:>6} MB       │",
        metrics.system.cpu_usage, metrics.system.memory_used_mb, metrics.system.memory_total_mb
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n  [Press Ctrl+C to stop test]");

    // Flush stdout to ensure immediate display
    let _ = io::stdout().flush();
}

/// Print final summary report
pub fn print_final_report(collector: &MetricsCollector) {
    let metrics = collector.get_snapshot();
    let elapsed = collector.elapsed().as_secs_f64();
    let latency = collector.get_request_latency_percentiles();

    println!("\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                    FINAL TEST REPORT                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    print_checks(&metrics);

    println!("\n📊 REQUESTS");
    println!("   Total Started:        {:>10}", metrics.requests.started);
    println!("   Total Completed:      {:>10}", metrics.requests.completed);
    println!("   Total Failed:         {:>10}", metrics.requests.failed);
    if metrics.requests.interrupted > 0 {
        println!("   Interrupted:          {:>10}", metrics.requests.interrupted);
    }
    for (status, count) in &metrics.requests.status_codes {
        println!("   Status {}:            {:>10}", status, count);
    }

    if elapsed > 0.0 {
        let throughput = metrics.requests.completed as f64 / elapsed;
        println!("   Throughput:           {:>10.2} requests/sec", throughput);
    }

    if latency.count > 0 {
        print_latency(&latency);
    }

    println!("\n👥 VIRTUAL USERS");
    println!("   Peak Active:          {:>10}", metrics.vus.peak);
    println!("   Iterations:           {:>10}", metrics.iterations.completed);
    println!("   Interrupted:          {:>10}", metrics.iterations.interrupted);

    println!("\n⏱️  Test Duration: {:.2} seconds", elapsed);
    println!("════════════════════════════════════════════════════════════════\n");
}

fn print_checks(metrics: &TestMetrics) {
    if metrics.checks.is_empty() {
        return;
    }

    println!("\n✅ CHECKS");
    for (name, stats) in &metrics.checks {
        let mark = if stats.fails == 0 { "✓" } else { "✗" };
        println!(
            "   {} {:<36} {:>6.2}%  ✓ {} ✗ {}",
            mark,
            name,
            stats.pass_rate(),
            stats.passes,
            stats.fails
        );
    }
}

fn print_latency(latency: &LatencyStats) {
    println!("\n📈 REQUEST LATENCY");
    println!("   Min:                  {:>10} ms", latency.min);
    println!("   P50 (Median):         {:>10} ms", latency.p50);
    println!("   P90:                  {:>10} ms", latency.p90);
    println!("   P95:                  {:>10} ms", latency.p95);
    println!("   P99:                  {:>10} ms", latency.p99);
    println!("   Max:                  {:>10} ms", latency.max);
    println!("   Mean:                 {:>10.2} ms", latency.mean);
}
