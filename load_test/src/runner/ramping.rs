//! Ramping virtual-user executor
//!
//! A controller ticks every [`CONTROLLER_TICK`], publishes the schedule's
//! target on a watch channel and keeps VU slots `0..target` occupied. VUs
//! above the target retire at their next iteration boundary; one that is
//! still busy `graceful_ramp_down` after retirement is interrupted. When the
//! schedule ends, running iterations get `graceful_stop` to finish.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::vu::{VirtualUser, Workload};
use crate::config::LoadTestConfig;
use crate::metrics::collector::MetricsCollector;
use crate::schedule::Schedule;

pub const CONTROLLER_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct RampingVus {
    pub schedule: Schedule,
    pub graceful_stop: Duration,
    pub graceful_ramp_down: Duration,
}

/// Result of a ramping run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Cancelled before the schedule finished
    pub aborted: bool,
    pub elapsed: Duration,
}

struct VuSlot {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    /// Set once the slot drops out of the target
    retire_deadline: Option<Instant>,
}

impl RampingVus {
    pub fn from_config(config: &LoadTestConfig) -> Self {
        Self {
            schedule: config.schedule.clone(),
            graceful_stop: config.graceful_stop,
            graceful_ramp_down: config.graceful_ramp_down,
        }
    }

    pub async fn run(
        &self,
        workload: &Workload,
        collector: &MetricsCollector,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let total = self.schedule.total_duration();
        let (target_tx, target_rx) = watch::channel(0usize);
        let mut slots: Vec<Option<VuSlot>> = (0..self.schedule.max_vus()).map(|_| None).collect();

        tracing::info!(
            "Ramping up to {} VUs over {}",
            self.schedule.max_vus(),
            humantime::format_duration(total)
        );

        let start = Instant::now();
        let mut ticker = interval(CONTROLLER_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_target = None;

        let aborted = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break true,
                _ = ticker.tick() => {}
            }

            let now = Instant::now();
            let elapsed = now - start;
            if elapsed >= total {
                break false;
            }

            let target = self.schedule.target_at(elapsed);
            if last_target != Some(target) {
                tracing::info!("VU target {} at {:.1}s", target, elapsed.as_secs_f64());
                last_target = Some(target);
            }
            target_tx.send_replace(target);
            collector.set_vu_target(target);

            for (index, slot) in slots.iter_mut().enumerate() {
                if slot.as_ref().is_some_and(|s| s.handle.is_finished()) {
                    *slot = None;
                }

                match slot {
                    None if index < target => {
                        *slot = Some(spawn_vu(index, workload, collector, &target_rx, cancel));
                    }
                    Some(active) if index < target => active.retire_deadline = None,
                    Some(retiring) => match retiring.retire_deadline {
                        None => retiring.retire_deadline = Some(now + self.graceful_ramp_down),
                        Some(deadline) if now >= deadline && !retiring.cancel.is_cancelled() => {
                            tracing::debug!(vu = index, "Graceful ramp-down expired, interrupting");
                            retiring.cancel.cancel();
                        }
                        Some(_) => {}
                    },
                    None => {}
                }
            }
        };

        target_tx.send_replace(0);
        collector.set_vu_target(0);

        let running: Vec<(usize, VuSlot)> = slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|slot| (index, slot)))
            .collect();

        if aborted {
            tracing::warn!("Load test cancelled, interrupting {} VUs", running.len());
        } else {
            tracing::info!(
                "Schedule complete, waiting up to {} for {} VUs to finish",
                humantime::format_duration(self.graceful_stop),
                running.len()
            );
        }

        stop_vus(running, if aborted { Duration::ZERO } else { self.graceful_stop }).await;

        RunOutcome {
            aborted,
            elapsed: start.elapsed(),
        }
    }
}

fn spawn_vu(
    index: usize,
    workload: &Workload,
    collector: &MetricsCollector,
    target: &watch::Receiver<usize>,
    cancel: &CancellationToken,
) -> VuSlot {
    let vu_cancel = cancel.child_token();
    let vu = VirtualUser {
        index,
        workload: workload.clone(),
        collector: collector.clone(),
        target: target.clone(),
        cancel: vu_cancel.clone(),
    };

    VuSlot {
        handle: tokio::spawn(vu.run()),
        cancel: vu_cancel,
        retire_deadline: None,
    }
}

/// Let VUs finish their current iteration within `grace`, then interrupt
/// the rest and wait for them.
async fn stop_vus(running: Vec<(usize, VuSlot)>, grace: Duration) {
    let mut pending = running;

    let drained = tokio::time::timeout(grace, async {
        while let Some((index, slot)) = pending.last_mut() {
            let result = (&mut slot.handle).await;
            log_join(*index, result);
            pending.pop();
        }
    })
    .await
    .is_ok();

    if !drained {
        tracing::info!(
            "Graceful stop expired, interrupting {} remaining VUs",
            pending.len()
        );
    }

    for (index, slot) in pending {
        slot.cancel.cancel();
        log_join(index, slot.handle.await);
    }
}

fn log_join(index: usize, result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            tracing::error!("VU task {} panicked: {}", index, e);
        }
    }
}
