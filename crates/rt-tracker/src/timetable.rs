//! # Timetable Estimator
//!
//! Segment probabilities from the scheduled times at each stop, allowing the
//! vehicle to run a little early or rather more late.

use crate::config::Config;
use crate::probability::Distribution;
use crate::profile::JourneyProfile;

/// Mass of segments whose schedule window excludes the current time.
pub const BACKGROUND: f64 = 0.08;
// Before the journey starts the schedule is a sharper signal.
const PRE_START_DAMPING: f64 = 5.0;

/// Estimate the segment distribution at `service_seconds` on the journey's
/// service day.
#[must_use]
pub fn estimate(service_seconds: i64, profile: &JourneyProfile, config: &Config) -> Distribution {
    let first = profile.start_time().seconds();
    let last = profile.end_time().seconds();
    let background =
        if service_seconds < first { BACKGROUND / PRE_START_DAMPING } else { BACKGROUND };

    let masses = (0..profile.segments())
        .map(|segment| {
            let plausible = match profile.endpoints(segment) {
                Some((start, end)) => {
                    let opens = start.scheduled_time.seconds() - config.early_tolerance;
                    let closes = end.scheduled_time.seconds() + config.late_tolerance;
                    (opens..=closes).contains(&service_seconds)
                }
                None if segment == 0 => service_seconds <= first + config.late_tolerance,
                None => service_seconds > last,
            };
            if plausible { 1.0 } else { background }
        })
        .collect();

    Distribution::normalized(masses)
}
