use std::time::Duration;

use crate::schedule::{Schedule, Stage};

pub const PROFILE_NAMES: [&str; 3] = ["standard", "smoke", "stress"];

/// Get a ramp schedule by profile name
pub fn get_profile(profile: &str) -> Schedule {
    match profile {
        "standard" => standard_profile(),
        "smoke" => smoke_profile(),
        "stress" => stress_profile(),
        _ => {
            tracing::warn!("Unknown profile '{}', using 'standard' profile", profile);
            standard_profile()
        }
    }
}

/// Standard profile, two minutes in total:
/// - ramp up to 10 VUs over 30s
/// - hold 10 VUs for 1m
/// - ramp down to 0 over 30s
pub fn standard_profile() -> Schedule {
    Schedule::new(
        0,
        vec![
            Stage::new(Duration::from_secs(30), 10),
            Stage::new(Duration::from_secs(60), 10),
            Stage::new(Duration::from_secs(30), 0),
        ],
    )
}

/// Single VU, for checking that the target is wired up:
/// - ramp up to 1 VU over 5s
/// - hold for 10s
/// - ramp down over 5s
pub fn smoke_profile() -> Schedule {
    Schedule::new(
        0,
        vec![
            Stage::new(Duration::from_secs(5), 1),
            Stage::new(Duration::from_secs(10), 1),
            Stage::new(Duration::from_secs(5), 0),
        ],
    )
}

/// Stress profile:
/// - ramp up to 50 VUs over 30s
/// - hold 50 VUs for 2m
/// - ramp down over 30s
pub fn stress_profile() -> Schedule {
    Schedule::new(
        0,
        vec![
            Stage::new(Duration::from_secs(30), 50),
            Stage::new(Duration::from_secs(120), 50),
            Stage::new(Duration::from_secs(30), 0),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_profile_falls_back_to_standard() {
        assert_eq!(get_profile("nope"), standard_profile());
    }

    #[test]
    fn test_every_named_profile_ends_at_zero() {
        for name in PROFILE_NAMES {
            let schedule = get_profile(name);
            assert_eq!(schedule.target_at(schedule.total_duration()), 0, "{}", name);
            assert!(schedule.max_vus() > 0, "{}", name);
        }
    }
}
