//! Virtual user loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::TodoClient;
use crate::metrics::collector::MetricsCollector;
use crate::scenarios::get_todo_by_id::{self, IterationContext};
use crate::scenarios::IterationOutcome;

/// What every virtual user runs against
#[derive(Debug, Clone)]
pub struct Workload {
    pub client: TodoClient,
    pub ids: Arc<[String]>,
    pub think_time: Duration,
}

pub(crate) struct VirtualUser {
    pub index: usize,
    pub workload: Workload,
    pub collector: MetricsCollector,
    pub target: watch::Receiver<usize>,
    pub cancel: CancellationToken,
}

impl VirtualUser {
    /// Run iterations back to back while this VU's index is below the
    /// published target. The target is only read between iterations.
    pub async fn run(self) {
        self.collector.vu_started();
        tracing::debug!(vu = self.index, "VU started");

        let mut iterations = 0usize;
        loop {
            if self.cancel.is_cancelled() || self.index >= *self.target.borrow() {
                break;
            }

            let ctx = IterationContext {
                vu: self.index,
                client: &self.workload.client,
                ids: &self.workload.ids,
                think_time: self.workload.think_time,
                collector: &self.collector,
                cancel: &self.cancel,
            };

            match get_todo_by_id::run_iteration(&ctx).await {
                IterationOutcome::Completed => {
                    iterations += 1;
                    self.collector.iteration_completed();
                }
                IterationOutcome::Interrupted => {
                    self.collector.iteration_interrupted();
                    break;
                }
            }
        }

        tracing::debug!(vu = self.index, iterations, "VU stopped");
        self.collector.vu_stopped();
    }
}
