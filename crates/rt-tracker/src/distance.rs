//! # Distance Estimator
//!
//! Segment probabilities from proximity to the route geometry, corrected for
//! positions that lie geometrically short of or past a segment.

use crate::config::Config;
use crate::geo::{self, Location};
use crate::probability::Distribution;
use crate::profile::{JourneyProfile, ProfileEntry};

/// Keeps very small distances from dominating, in metres.
pub const ADJUST: f64 = 50.0;
/// Weight factor for a position past the end of a segment.
pub const BEYOND_ADJUST: f64 = 0.5;
/// Weight factor for a position short of the start of a segment.
pub const BEFORE_ADJUST: f64 = 0.5;

// Turns milder than this use a plain half-plane test.
const MILD_TURN: f64 = 45.0;
// Bearings from a stop to a position closer than this are meaningless.
const MIN_BEARING_DISTANCE: f64 = 1.0;

/// Where a position lies relative to an interior segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    Within,
    Beyond,
}

impl Placement {
    /// Weight factor applied for this placement.
    #[must_use]
    pub const fn adjustment(self) -> f64 {
        match self {
            Self::Before => BEFORE_ADJUST,
            Self::Within => 1.0,
            Self::Beyond => BEYOND_ADJUST,
        }
    }
}

/// Estimate the segment distribution for `position`.
#[must_use]
pub fn estimate(position: &Location, profile: &JourneyProfile, config: &Config) -> Distribution {
    let raw = raw_distances(position, profile);

    let mut ranked: Vec<usize> = (0..raw.len()).collect();
    ranked.sort_by(|a, b| raw[*a].total_cmp(&raw[*b]).then(a.cmp(b)));

    let mut masses = vec![0.0; raw.len()];
    for &segment in ranked.iter().take(config.top_k) {
        let weight = ADJUST / (raw[segment] / 2.0 + ADJUST);
        masses[segment] = weight * placement(position, profile, segment).adjustment();
    }

    Distribution::normalized(masses)
}

/// Distance from `position` to each logical segment.
#[must_use]
pub fn raw_distances(position: &Location, profile: &JourneyProfile) -> Vec<f64> {
    let last = profile.last_segment();
    (0..profile.segments())
        .map(|segment| match profile.endpoints(segment) {
            Some((start, end)) => position.cross_track(&start.location, &end.location),
            None if segment == last => position.distance(&profile.last().location),
            None => position.distance(&profile.first().location),
        })
        .collect()
}

/// Classify `position` against `segment`. The open-ended segments 0 and N
/// are always `Within`.
#[must_use]
pub fn placement(position: &Location, profile: &JourneyProfile, segment: usize) -> Placement {
    let Some((leading, trailing)) = profile.endpoints(segment) else {
        return Placement::Within;
    };

    if is_beyond(position, trailing) {
        Placement::Beyond
    } else if is_before(position, leading) {
        Placement::Before
    } else {
        Placement::Within
    }
}

fn is_beyond(position: &Location, stop: &ProfileEntry) -> bool {
    let Some(bearing) = bearing_from(stop, position) else {
        return false;
    };

    let outgoing = stop.outgoing();
    if is_mild(stop.turn) {
        geo::separation(bearing, outgoing) < 90.0
    } else {
        geo::within_arc(stop.bisector, outgoing, bearing)
    }
}

fn is_before(position: &Location, stop: &ProfileEntry) -> bool {
    let Some(bearing) = bearing_from(stop, position) else {
        return false;
    };

    if is_mild(stop.turn) {
        let back = geo::normalize(stop.outgoing() + 180.0);
        geo::separation(bearing, back) < 90.0
    } else {
        let reversed = geo::normalize(stop.bearing + 180.0);
        geo::within_arc(reversed, stop.bisector, bearing)
    }
}

fn bearing_from(stop: &ProfileEntry, position: &Location) -> Option<f64> {
    (stop.location.distance(position) >= MIN_BEARING_DISTANCE)
        .then(|| stop.location.bearing(position))
}

fn is_mild(turn: f64) -> bool {
    !(MILD_TURN..=360.0 - MILD_TURN).contains(&turn)
}
