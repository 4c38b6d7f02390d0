use std::env;

use chrono_tz::Tz;

const DEFAULT_TOP_K: usize = 5;
const DEFAULT_EARLY_TOLERANCE: i64 = 120;
const DEFAULT_LATE_TOLERANCE: i64 = 600;

/// Tracker configuration derived from the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Timezone the route's scheduled times are expressed in.
    pub timezone: Tz,
    /// Number of closest segments the distance estimator keeps.
    pub top_k: usize,
    /// Seconds a vehicle may run ahead of a segment's schedule window.
    pub early_tolerance: i64,
    /// Seconds a vehicle may run behind a segment's schedule window.
    pub late_tolerance: i64,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        let timezone = env::var("TIMEZONE")
            .ok()
            .and_then(|value| value.parse::<Tz>().ok())
            .unwrap_or(chrono_tz::Europe::London);
        let top_k = env_usize("TRACKER_TOP_K", DEFAULT_TOP_K).max(1);
        let early_tolerance = env_i64("TRACKER_EARLY_TOLERANCE", DEFAULT_EARLY_TOLERANCE);
        let late_tolerance = env_i64("TRACKER_LATE_TOLERANCE", DEFAULT_LATE_TOLERANCE);

        Self { timezone, top_k, early_tolerance, late_tolerance }
    }

    /// Configuration with the default tuning in the given timezone, ignoring
    /// the environment.
    #[must_use]
    pub const fn with_timezone(timezone: Tz) -> Self {
        Self {
            timezone,
            top_k: DEFAULT_TOP_K,
            early_tolerance: DEFAULT_EARLY_TOLERANCE,
            late_tolerance: DEFAULT_LATE_TOLERANCE,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|value| value.parse::<usize>().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|value| value.parse::<i64>().ok()).unwrap_or(default)
}
