//! Runs the scenario under a schedule (`run`) or once (`smoke`)

pub mod ramping;
pub mod vu;

use tokio_util::sync::CancellationToken;

use crate::client::TodoClient;
use crate::config::LoadTestConfig;
use crate::error::Result;
use crate::metrics::collector::MetricsCollector;
use crate::metrics::reporter;
use crate::scenarios::get_todo_by_id::{self, IterationContext};
use crate::scenarios::IterationOutcome;

pub use ramping::{RampingVus, RunOutcome};
pub use vu::Workload;

impl Workload {
    pub fn from_config(config: &LoadTestConfig) -> Result<Self> {
        Ok(Self {
            client: TodoClient::from_config(config)?,
            ids: config.ids.iter().cloned().collect::<Vec<_>>().into(),
            think_time: config.think_time,
        })
    }
}

/// Run the full ramping load test. Returns once the schedule and graceful
/// stop are over, or as soon as `cancel` fires.
pub async fn run_load_test(
    config: &LoadTestConfig,
    collector: &MetricsCollector,
    cancel: &CancellationToken,
) -> Result<RunOutcome> {
    let workload = Workload::from_config(config)?;
    let executor = RampingVus::from_config(config);

    let reporter_stop = CancellationToken::new();
    let reporter_handle = (config.report_interval > 0).then(|| {
        tokio::spawn(reporter::start_periodic_reporter(
            collector.clone(),
            config.report_interval,
            reporter_stop.clone(),
        ))
    });

    let outcome = executor.run(&workload, collector, cancel).await;

    // the last live redraw must land before the caller prints the final report
    reporter_stop.cancel();
    if let Some(handle) = reporter_handle {
        if let Err(e) = handle.await {
            tracing::error!("Metrics reporter task failed: {}", e);
        }
    }

    tracing::info!(
        "Run finished after {:.1}s (aborted: {})",
        outcome.elapsed.as_secs_f64(),
        outcome.aborted
    );
    Ok(outcome)
}

/// One VU, one iteration over the identifier list.
pub async fn run_smoke(
    config: &LoadTestConfig,
    collector: &MetricsCollector,
    cancel: &CancellationToken,
) -> Result<IterationOutcome> {
    let workload = Workload::from_config(config)?;
    collector.set_vu_target(1);
    collector.vu_started();

    let ctx = IterationContext {
        vu: 0,
        client: &workload.client,
        ids: &workload.ids,
        think_time: workload.think_time,
        collector,
        cancel,
    };
    let outcome = get_todo_by_id::run_iteration(&ctx).await;

    match outcome {
        IterationOutcome::Completed => collector.iteration_completed(),
        IterationOutcome::Interrupted => collector.iteration_interrupted(),
    }
    collector.vu_stopped();
    collector.set_vu_target(0);

    Ok(outcome)
}
