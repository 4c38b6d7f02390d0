//! # Tracker
//!
//! Per-vehicle state machine fusing the distance, progress and timetable
//! estimates into a single segment placement.
//!
//! A tracker is owned by whatever processes one vehicle's report stream and
//! is not shared between threads; hosts serialise updates per vehicle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::Config;
use crate::error::Error;
use crate::geo::Location;
use crate::probability::{self, Distribution};
use crate::profile::JourneyProfile;
use crate::progress::{self, Anchor};
use crate::report::{Fix, PositionReport};
use crate::schedule::{self, RouteStop};
use crate::stops::StopLookup;
use crate::weights::{Context, Weights};
use crate::{distance, timetable};

/// Lifecycle of a tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// No placement on a journey yet.
    #[default]
    Uninitialized,
    /// A placement exists and is refined by every update.
    Tracking,
}

/// Where the vehicle is on its journey.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResult {
    /// Segment in `0..=N`.
    pub segment_index: usize,
    /// Straight-line progress through the segment in `[0, 1]`; 0 for the
    /// open-ended segments.
    pub progress_fraction: f64,
}

/// The vectors behind the latest placement, kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Estimates {
    pub distance: Option<Distribution>,
    pub progress: Option<Distribution>,
    pub timetable: Option<Distribution>,
    pub combined: Option<Distribution>,
    pub weights: Option<Weights>,
}

/// Position estimator for one vehicle.
#[derive(Debug, Clone)]
pub struct Tracker {
    config: Arc<Config>,
    vehicle_id: Option<String>,
    state: State,
    profile: Option<JourneyProfile>,
    last_fix: Option<Fix>,
    anchor: Option<Anchor>,
    estimates: Estimates,
}

impl Tracker {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            vehicle_id: None,
            state: State::Uninitialized,
            profile: None,
            last_fix: None,
            anchor: None,
            estimates: Estimates::default(),
        }
    }

    /// Record the vehicle and its first report. No segment is computed until
    /// a journey is assigned.
    ///
    /// # Errors
    ///
    /// Will return `Error::InvalidReport` if the report is malformed; the
    /// tracker is left unchanged.
    pub fn init(&mut self, report: &PositionReport) -> Result<()> {
        let fix = report.fix()?;
        self.vehicle_id = Some(report.vehicle_id.clone());
        self.last_fix = Some(fix);
        debug!(vehicle_id = %report.vehicle_id, "Tracker initialised");
        Ok(())
    }

    /// Assign a journey, replacing any previous one.
    ///
    /// When a report is already known the vehicle is placed straight away
    /// from the distance and timetable estimates.
    ///
    /// # Errors
    ///
    /// Will return `Error::InsufficientStops` if fewer than two route stops
    /// resolve. The tracker is then left without a journey and updates fail
    /// with `Error::NoJourney` until a usable one is assigned.
    pub fn init_journey(
        &mut self, route: &[RouteStop], lookup: &impl StopLookup,
    ) -> Result<Option<TrackingResult>> {
        self.state = State::Uninitialized;
        self.anchor = None;
        self.estimates = Estimates::default();

        let profile = match JourneyProfile::build(route, lookup) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(vehicle_id = %self.name(), error = %err, "Journey not usable");
                self.profile = None;
                return Err(err);
            }
        };
        info!(
            vehicle_id = %self.name(),
            stops = profile.len(),
            start = %profile.start_time(),
            end = %profile.end_time(),
            "Journey assigned"
        );

        let Some(fix) = self.last_fix else {
            self.profile = Some(profile);
            return Ok(None);
        };

        let service = schedule::service_seconds(
            fix.recorded_at,
            self.config.timezone,
            profile.start_time(),
        );
        let weights = Context::classify(true, service, &profile).weights();
        let distance = distance::estimate(&fix.location, &profile, &self.config);
        let timetable = timetable::estimate(service, &profile, &self.config);
        let combined =
            probability::combine(&[&distance, &timetable], &[weights.distance, weights.timetable]);

        let result = place(&profile, &combined, &fix.location);
        debug!(
            vehicle_id = %self.name(),
            segment = result.segment_index,
            fraction = result.progress_fraction,
            "Initial placement"
        );

        self.estimates = Estimates {
            distance: Some(distance),
            progress: None,
            timetable: Some(timetable),
            combined: Some(combined),
            weights: Some(weights),
        };
        self.settle(fix, result);
        self.profile = Some(profile);
        Ok(Some(result))
    }

    /// Refine the placement with a new report.
    ///
    /// A report no newer than the last processed one changes nothing and
    /// returns the current placement.
    ///
    /// # Errors
    ///
    /// Will return `Error::InvalidReport` if the report is malformed, leaving
    /// the tracker unchanged, or `Error::NoJourney` if no journey has been
    /// assigned. In the latter case the report is still remembered so the
    /// next journey starts from it.
    pub fn update(&mut self, report: &PositionReport) -> Result<TrackingResult> {
        let fix = report.fix()?;
        if self.vehicle_id.is_none() {
            self.vehicle_id = Some(report.vehicle_id.clone());
        }

        let Some(profile) = self.profile.as_ref() else {
            if self.last_fix.is_none_or(|last| fix.recorded_at > last.recorded_at) {
                self.last_fix = Some(fix);
            }
            return Err(Error::NoJourney);
        };

        if let Some(anchor) = self.anchor {
            if fix.recorded_at <= anchor.fix.recorded_at {
                if fix.recorded_at < anchor.fix.recorded_at {
                    warn!(
                        vehicle_id = %report.vehicle_id,
                        recorded_time = %report.recorded_time,
                        "Out-of-order report ignored"
                    );
                } else {
                    debug!(vehicle_id = %report.vehicle_id, "Duplicate report ignored");
                }
                return Ok(result_of(&anchor));
            }
        }

        let service =
            schedule::service_seconds(fix.recorded_at, self.config.timezone, profile.start_time());
        let first_estimate = self.estimates.progress.is_none();
        let weights = Context::classify(first_estimate, service, profile).weights();

        let distance = distance::estimate(&fix.location, profile, &self.config);
        let progress = progress::estimate(&fix, service, profile, self.anchor.as_ref());
        let timetable = timetable::estimate(service, profile, &self.config);
        let combined = probability::combine(
            &[&distance, &progress, &timetable],
            &[weights.distance, weights.progress, weights.timetable],
        );

        let result = place(profile, &combined, &fix.location);
        debug!(
            vehicle_id = %report.vehicle_id,
            ?weights,
            distance = ?distance.values(),
            progress = ?progress.values(),
            timetable = ?timetable.values(),
            segment = result.segment_index,
            fraction = result.progress_fraction,
            "Updated placement"
        );

        self.estimates = Estimates {
            distance: Some(distance),
            progress: Some(progress),
            timetable: Some(timetable),
            combined: Some(combined),
            weights: Some(weights),
        };
        self.settle(fix, result);
        Ok(result)
    }

    /// Latest placement, once one exists.
    #[must_use]
    pub fn position(&self) -> Option<TrackingResult> {
        self.anchor.as_ref().map(result_of)
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub const fn estimates(&self) -> &Estimates {
        &self.estimates
    }

    #[must_use]
    pub fn vehicle_id(&self) -> Option<&str> {
        self.vehicle_id.as_deref()
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&JourneyProfile> {
        self.profile.as_ref()
    }

    /// Time of the newest report seen.
    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_fix.map(|fix| fix.recorded_at)
    }

    fn settle(&mut self, fix: Fix, result: TrackingResult) {
        self.last_fix = Some(fix);
        self.anchor =
            Some(Anchor { fix, segment: result.segment_index, fraction: result.progress_fraction });
        self.state = State::Tracking;
    }

    fn name(&self) -> &str {
        self.vehicle_id.as_deref().unwrap_or_default()
    }
}

const fn result_of(anchor: &Anchor) -> TrackingResult {
    TrackingResult { segment_index: anchor.segment, progress_fraction: anchor.fraction }
}

fn place(profile: &JourneyProfile, combined: &Distribution, position: &Location) -> TrackingResult {
    let segment_index = combined.argmax().min(profile.last_segment());
    let progress_fraction = progress_fraction(profile, segment_index, position);
    TrackingResult { segment_index, progress_fraction }
}

/// Straight-line interpolation between the stops bounding `segment`; road
/// curvature is ignored.
#[must_use]
pub fn progress_fraction(profile: &JourneyProfile, segment: usize, position: &Location) -> f64 {
    let Some((start, end)) = profile.endpoints(segment) else {
        return 0.0;
    };

    let to_start = position.distance(&start.location);
    let to_end = position.distance(&end.location);
    let total = to_start + to_end;
    if total > 0.0 { (to_start / total).clamp(0.0, 1.0) } else { 0.0 }
}
