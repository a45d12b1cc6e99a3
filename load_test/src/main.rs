use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use todo_load_test::backend::{self, store::TodoStore, BackendState};
use todo_load_test::cli::{Cli, Mode};
use todo_load_test::config::LoadTestConfig;
use todo_load_test::metrics::collector::MetricsCollector;
use todo_load_test::metrics::reporter;
use todo_load_test::metrics::summary::Summary;
use todo_load_test::runner;
use todo_load_test::scenarios::IterationOutcome;

fn init_tracing(verbose: bool) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Cancel the returned token on Ctrl+C
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl+C received, stopping");
            token.cancel();
        }
    });
    cancel
}

fn log_target(config: &LoadTestConfig) {
    tracing::info!("Base URL: {}", config.base_url);
    tracing::info!("Identifiers: {}", config.ids.len());
    tracing::info!(
        "Think Time: {}",
        humantime::format_duration(config.think_time)
    );
    tracing::info!(
        "Request Timeout: {}",
        humantime::format_duration(config.request_timeout)
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    match cli.mode {
        Mode::Run(args) => {
            init_tracing(args.target.verbose)?;
            let config = args.resolve()?;

            tracing::info!("Todo API Load Test Starting...");
            log_target(&config);
            for (n, stage) in config.schedule.stages.iter().enumerate() {
                tracing::info!("  Stage {}: {}", n + 1, stage);
            }

            let collector = MetricsCollector::new();
            let cancel = cancel_on_ctrl_c();
            let outcome = runner::run_load_test(&config, &collector, &cancel).await?;

            collector.update_system_metrics();
            reporter::print_final_report(&collector);

            if let Some(path) = &args.target.summary_export {
                Summary::from_collector(&collector, Some(&config), outcome.aborted).export(path)?;
            }

            tracing::info!("Load test complete");
        }

        Mode::Smoke(args) => {
            init_tracing(args.target.verbose)?;
            let config = args.resolve()?;

            tracing::info!("Todo API Smoke Test Starting...");
            log_target(&config);

            let collector = MetricsCollector::new();
            let cancel = cancel_on_ctrl_c();
            let outcome = runner::run_smoke(&config, &collector, &cancel).await?;

            reporter::print_final_report(&collector);

            let aborted = outcome == IterationOutcome::Interrupted;
            if let Some(path) = &args.target.summary_export {
                Summary::from_collector(&collector, Some(&config), aborted).export(path)?;
            }

            let metrics = collector.get_snapshot();
            if aborted {
                anyhow::bail!("Smoke test interrupted");
            }
            if metrics.requests.failed > 0 || metrics.failed_checks() > 0 {
                anyhow::bail!(
                    "Smoke test failed: {} failed requests, {} failed checks",
                    metrics.requests.failed,
                    metrics.failed_checks()
                );
            }

            tracing::info!("Smoke test passed");
        }

        Mode::Backend(args) => {
            init_tracing(args.verbose)?;

            let store = TodoStore::seeded(args.seed_ids().as_slice(), args.absent.as_slice());
            tracing::info!(
                "Seeded {} todos ({} absent)",
                store.len(),
                args.absent.len()
            );
            if let Some(latency) = args.latency {
                tracing::info!("Injected latency: {}", humantime::format_duration(latency));
            }

            let listener = backend::bind(args.listen).await?;
            tracing::info!("Backend ready. Press Ctrl+C to stop.");
            backend::serve(
                listener,
                BackendState::new(store, args.latency),
                cancel_on_ctrl_c(),
            )
            .await?;
        }
    }

    Ok(())
}
