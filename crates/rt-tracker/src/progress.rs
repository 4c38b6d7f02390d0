//! # Progress Estimator
//!
//! Segment probabilities from how far the vehicle can plausibly have travelled
//! since the previous report.

use crate::probability::Distribution;
use crate::profile::JourneyProfile;
use crate::report::Fix;

/// Mass of segments outside the reach window.
pub const BACKGROUND: f64 = 0.1;
/// Hops shorter than this are treated as standing still or report noise.
pub const STATIONARY_HOP: f64 = 50.0;
/// Slowest modelled speed, in m/s.
pub const MIN_SPEED: f64 = 6.1;
/// Fastest modelled speed, in m/s.
pub const MAX_SPEED: f64 = 15.0;

// Segment lengths mapped onto MIN_SPEED and MAX_SPEED.
const SHORT_SEGMENT: f64 = 300.0;
const LONG_SEGMENT: f64 = 1_500.0;

const HOP_OVERSHOOT: f64 = 1.05;
const REACH_MARGIN: f64 = 1.3;
const FAST_REACH_MARGIN: f64 = 1.1;

const NOT_STARTED: [f64; 2] = [0.9, 0.1];

/// Where the vehicle was last placed on the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub fix: Fix,
    pub segment: usize,
    pub fraction: f64,
}

/// Estimate the segment distribution for `fix`, projecting forward from
/// `previous`. Without a previous placement the vehicle is assumed to be at
/// the route start with no elapsed hop.
#[must_use]
pub fn estimate(
    fix: &Fix, service_seconds: i64, profile: &JourneyProfile, previous: Option<&Anchor>,
) -> Distribution {
    let segments = profile.segments();

    if service_seconds < profile.start_time().seconds() {
        let mut values = vec![0.0; segments];
        values[..NOT_STARTED.len()].copy_from_slice(&NOT_STARTED);
        return Distribution::exact(values);
    }

    let (segment, fraction, hop_time, hop_distance) = previous.map_or((0, 0.0, 0.0, 0.0), |prev| {
        (
            prev.segment.min(profile.last_segment()),
            prev.fraction,
            fix.seconds_since(&prev.fix).max(0.0),
            prev.fix.location.distance(&fix.location),
        )
    });

    let (delta, margin) = if hop_distance < STATIONARY_HOP {
        (hop_distance, REACH_MARGIN)
    } else {
        let projected = speed(profile, segment) * hop_time;
        let observed = hop_distance * HOP_OVERSHOOT;
        if observed > projected { (observed, FAST_REACH_MARGIN) } else { (projected, REACH_MARGIN) }
    };

    let current = profile.route_distance(segment, fraction);
    let reach = delta.mul_add(margin, current);

    let mut masses = vec![BACKGROUND; segments];
    if segment == 0 {
        masses[0] = 1.0;
    }
    for (index, mass) in masses.iter_mut().enumerate().skip(1) {
        let plausible = match profile.endpoints(index) {
            Some((start, end)) => end.distance >= current && start.distance <= reach,
            None => reach >= profile.total_distance(),
        };
        if plausible {
            *mass = 1.0;
        }
    }

    Distribution::normalized(masses)
}

/// Plausible forward speed around `segment`, from the mean length of the
/// neighbouring interior segments.
#[must_use]
pub fn speed(profile: &JourneyProfile, segment: usize) -> f64 {
    let lengths: Vec<f64> = (segment.saturating_sub(1)..=segment + 1)
        .filter(|neighbour| profile.is_interior(*neighbour))
        .map(|neighbour| profile.segment_length(neighbour))
        .collect();
    if lengths.is_empty() {
        return MIN_SPEED;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let ratio = (mean - SHORT_SEGMENT) / (LONG_SEGMENT - SHORT_SEGMENT);
    ratio.mul_add(MAX_SPEED - MIN_SPEED, MIN_SPEED).clamp(MIN_SPEED, MAX_SPEED)
}
