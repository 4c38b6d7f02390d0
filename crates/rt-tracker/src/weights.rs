//! Context-dependent weights for fusing the three estimators.

use serde::{Deserialize, Serialize};

use crate::profile::JourneyProfile;

// A vehicle within this many seconds of its scheduled start is "just started".
const JUST_STARTED: i64 = 10 * 60;

const BUCKETS: usize = 5;

/// Weight of each estimator in the linear combination.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Weights {
    pub distance: f64,
    pub progress: f64,
    pub timetable: f64,
}

impl Weights {
    #[must_use]
    pub const fn new(distance: f64, progress: f64, timetable: f64) -> Self {
        Self { distance, progress, timetable }
    }
}

const START: Weights = Weights::new(0.4, 0.0, 0.6);
const UNDERWAY: Weights = Weights::new(0.3, 0.0, 0.7);
const STEADY: Weights = Weights::new(0.25, 0.5, 0.25);

// Rows: first estimate, steady state. Columns: start proximity bucket.
// TODO: the steady row is flat across buckets; revisit once tuned against
// annotated traces.
const TABLE: [[Weights; BUCKETS]; 2] = [
    [UNDERWAY, UNDERWAY, UNDERWAY, UNDERWAY, START],
    [STEADY, STEADY, STEADY, STEADY, STEADY],
];

/// Inputs to the weight lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Context {
    /// No progress estimate exists yet for this vehicle.
    pub first_estimate: bool,
    /// How close the journey is to its start, in `[0, 1]`.
    pub start_proximity: f64,
}

impl Context {
    /// Classify the current situation of a vehicle on `profile`.
    #[must_use]
    pub fn classify(first_estimate: bool, service_seconds: i64, profile: &JourneyProfile) -> Self {
        Self { first_estimate, start_proximity: start_proximity(service_seconds, profile) }
    }

    #[must_use]
    pub fn bucket(&self) -> usize {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bucket = (self.start_proximity.clamp(0.0, 1.0) * 5.0).floor() as usize;
        bucket.min(BUCKETS - 1)
    }

    /// Look up the weights for this context.
    #[must_use]
    pub fn weights(&self) -> Weights {
        let row = usize::from(!self.first_estimate);
        TABLE[row][self.bucket()]
    }
}

/// 1.0 before the scheduled start, 0.8 shortly after it, 0.0 once a third of
/// the scheduled duration has elapsed and 0.4 otherwise.
#[must_use]
pub fn start_proximity(service_seconds: i64, profile: &JourneyProfile) -> f64 {
    let start = profile.start_time().seconds();
    let duration = profile.end_time().seconds() - start;
    let elapsed = service_seconds - start;

    if elapsed < 0 {
        1.0
    } else if elapsed <= JUST_STARTED {
        0.8
    } else if elapsed * 3 > duration {
        0.0
    } else {
        0.4
    }
}
