//! Ramping virtual-user schedule
//!
//! A schedule is an ordered list of stages. Within a stage the VU target
//! moves linearly from the previous stage's target (or `start_vus` for the
//! first stage) to the stage's own target.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One ramp stage: reach `target` VUs over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub const fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    /// Parse `<duration>:<target>`, e.g. `30s:10` or `1m30s:0`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidStage(s.to_string());

        let (duration, target) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        let duration = humantime::parse_duration(duration.trim()).map_err(|_| invalid())?;
        let target = target.trim().parse::<usize>().map_err(|_| invalid())?;

        Ok(Stage::new(duration, target))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            humantime::format_duration(self.duration),
            self.target
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// VU count at the start of the first stage
    #[serde(default)]
    pub start_vus: usize,
    pub stages: Vec<Stage>,
}

impl Schedule {
    pub fn new(start_vus: usize, stages: Vec<Stage>) -> Self {
        Self { start_vus, stages }
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|stage| stage.duration).sum()
    }

    /// Upper bound on concurrently active VUs
    pub fn max_vus(&self) -> usize {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .fold(self.start_vus, usize::max)
    }

    /// Planned VU count at `elapsed` since the start of the run.
    ///
    /// Rounds toward the stage's starting value, so while ramping up a VU
    /// is added once it is fully due and while ramping down a VU is removed
    /// once it is fully due. Past the end of the schedule this is the last
    /// stage's target.
    pub fn target_at(&self, elapsed: Duration) -> usize {
        let mut from = self.start_vus;
        let mut stage_start = Duration::ZERO;

        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let progress =
                    (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
                return interpolate(from, stage.target, progress);
            }
            from = stage.target;
            stage_start = stage_end;
        }

        from
    }
}

fn interpolate(from: usize, to: usize, progress: f64) -> usize {
    let progress = progress.clamp(0.0, 1.0);
    if to >= from {
        let step = ((to - from) as f64 * progress).floor() as usize;
        from + step.min(to - from)
    } else {
        let step = ((from - to) as f64 * progress).floor() as usize;
        from - step.min(from - to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Schedule {
        Schedule::new(
            0,
            vec![
                Stage::new(Duration::from_secs(30), 10),
                Stage::new(Duration::from_secs(60), 10),
                Stage::new(Duration::from_secs(30), 0),
            ],
        )
    }

    #[test]
    fn test_total_duration_is_two_minutes() {
        assert_eq!(standard().total_duration(), Duration::from_secs(120));
        assert_eq!(standard().max_vus(), 10);
    }

    #[test]
    fn test_ramp_up_adds_vus_once_due() {
        let schedule = standard();
        assert_eq!(schedule.target_at(Duration::ZERO), 0);
        assert_eq!(schedule.target_at(Duration::from_millis(2_999)), 0);
        assert_eq!(schedule.target_at(Duration::from_secs(3)), 1);
        assert_eq!(schedule.target_at(Duration::from_millis(29_999)), 9);
        assert_eq!(schedule.target_at(Duration::from_secs(30)), 10);
    }

    #[test]
    fn test_hold_and_ramp_down() {
        let schedule = standard();
        assert_eq!(schedule.target_at(Duration::from_secs(60)), 10);
        assert_eq!(schedule.target_at(Duration::from_millis(90_100)), 10);
        assert_eq!(schedule.target_at(Duration::from_secs(93)), 9);
        assert_eq!(schedule.target_at(Duration::from_millis(119_999)), 1);
        assert_eq!(schedule.target_at(Duration::from_secs(120)), 0);
        assert_eq!(schedule.target_at(Duration::from_secs(600)), 0);
    }

    #[test]
    fn test_target_stays_within_bounds() {
        let schedule = standard();
        let mut previous = 0usize;
        for ms in (0..=125_000u64).step_by(100) {
            let target = schedule.target_at(Duration::from_millis(ms));
            assert!(target <= 10, "target {} at {}ms", target, ms);
            assert!(target.abs_diff(previous) <= 1, "jump at {}ms", ms);
            previous = target;
        }
    }

    #[test]
    fn test_zero_length_stage_jumps() {
        let schedule = Schedule::new(
            0,
            vec![
                Stage::new(Duration::ZERO, 5),
                Stage::new(Duration::from_secs(10), 5),
            ],
        );
        assert_eq!(schedule.target_at(Duration::ZERO), 5);
        assert_eq!(schedule.target_at(Duration::from_secs(4)), 5);
    }

    #[test]
    fn test_empty_schedule_uses_start_vus() {
        let schedule = Schedule::new(3, Vec::new());
        assert_eq!(schedule.total_duration(), Duration::ZERO);
        assert_eq!(schedule.target_at(Duration::from_secs(1)), 3);
        assert_eq!(schedule.max_vus(), 3);
    }

    #[test]
    fn test_parse_stage() {
        let stage: Stage = "30s:10".parse().unwrap();
        assert_eq!(stage, Stage::new(Duration::from_secs(30), 10));

        let stage: Stage = "1m30s:0".parse().unwrap();
        assert_eq!(stage, Stage::new(Duration::from_secs(90), 0));
        assert_eq!(stage.to_string(), "1m 30s:0");
    }

    #[test]
    fn test_parse_stage_rejects_garbage() {
        for input in ["", "30s", "abc:10", "30s:-1", "30s:ten"] {
            assert!(
                matches!(input.parse::<Stage>(), Err(ConfigError::InvalidStage(_))),
                "accepted {:?}",
                input
            );
        }
    }
}
