//! Get-by-id scenario - walk the identifier list with `GET /todo/{id}`

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::IterationOutcome;
use crate::checks;
use crate::client::{RequestError, TodoClient, TodoResponse};
use crate::metrics::collector::MetricsCollector;

/// Everything one iteration needs, borrowed from its virtual user
pub struct IterationContext<'a> {
    pub vu: usize,
    pub client: &'a TodoClient,
    pub ids: &'a [String],
    pub think_time: Duration,
    pub collector: &'a MetricsCollector,
    pub cancel: &'a CancellationToken,
}

/// Request every identifier in order, checking each response and pausing
/// `think_time` after it. Failed checks and failed requests are recorded and
/// the iteration moves on to the next identifier.
pub async fn run_iteration(ctx: &IterationContext<'_>) -> IterationOutcome {
    for id in ctx.ids {
        ctx.collector.request_started();
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                ctx.collector.request_interrupted();
                return IterationOutcome::Interrupted;
            }
            result = ctx.client.get_todo(id) => result,
        };
        record_response(ctx.collector, ctx.vu, id, start.elapsed(), result);

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return IterationOutcome::Interrupted,
            _ = tokio::time::sleep(ctx.think_time) => {}
        }
    }

    IterationOutcome::Completed
}

/// Record one request and its checks. A completed request reports its own
/// `elapsed`; `waited` is the latency charged to a failed one.
pub(crate) fn record_response(
    collector: &MetricsCollector,
    vu: usize,
    id: &str,
    waited: Duration,
    result: Result<TodoResponse, RequestError>,
) {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(vu, id, "Request failed: {}", e);
            collector.request_failed(waited.as_millis() as u64);
            // no response reads as status 0, which never passes
            collector.record_check(checks::STATUS_200_OR_404, false);
            return;
        }
    };

    collector.request_completed(response.status, response.elapsed.as_millis() as u64);

    let accepted = checks::status_accepted(response.status);
    if !accepted {
        tracing::warn!(vu, id, status = response.status, "Unexpected status");
    }
    collector.record_check(checks::STATUS_200_OR_404, accepted);

    if response.status == 200 {
        let matched = match checks::id_matches(&response.body, id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(vu, id, "ID check failed: {}", e);
                false
            }
        };
        collector.record_check(checks::ID_MATCHES, matched);
    }
}
