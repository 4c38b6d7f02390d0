//! # Bus Tracker
//!
//! Hosts one [`Tracker`] per vehicle and routes position reports and journey
//! assignments to them.
//!
//! Each vehicle's tracker sits behind its own map entry, so reports for one
//! vehicle are applied one at a time while different vehicles proceed
//! independently. Failures stay with the vehicle they belong to.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
pub use rt_tracker::*;
use tracing::{debug, info, warn};

/// Trackers for every vehicle currently reporting.
#[derive(Debug)]
pub struct Fleet<L: StopLookup> {
    config: Arc<Config>,
    stops: Arc<L>,
    trackers: DashMap<String, Tracker>,
}

impl<L: StopLookup> Fleet<L> {
    /// Create an empty fleet resolving journeys against `stops`.
    #[must_use]
    pub fn new(config: Config, stops: L) -> Self {
        Self::from_shared(Arc::new(config), Arc::new(stops))
    }

    #[must_use]
    pub fn from_shared(config: Arc<Config>, stops: Arc<L>) -> Self {
        Self { config, stops, trackers: DashMap::new() }
    }

    #[must_use]
    pub fn stops(&self) -> &L {
        &self.stops
    }

    /// Apply a position report.
    ///
    /// The first report for a vehicle only registers it. Later reports refine
    /// its placement once a journey is assigned; until then they are recorded
    /// and `None` is returned.
    ///
    /// # Errors
    ///
    /// Will return `Error::InvalidReport` if the report is malformed. The
    /// vehicle's tracker is left unchanged.
    pub fn observe(&self, report: &PositionReport) -> Result<Option<TrackingResult>> {
        match self.trackers.entry(report.vehicle_id.clone()) {
            Entry::Vacant(entry) => {
                let mut tracker = Tracker::new(Arc::clone(&self.config));
                tracker.init(report)?;
                entry.insert(tracker);
                info!(vehicle_id = %report.vehicle_id, "Tracking new vehicle");
                Ok(None)
            }
            Entry::Occupied(mut entry) => match entry.get_mut().update(report) {
                Ok(result) => Ok(Some(result)),
                Err(Error::NoJourney) => {
                    debug!(vehicle_id = %report.vehicle_id, "No journey assigned yet");
                    Ok(None)
                }
                Err(err) => {
                    warn!(vehicle_id = %report.vehicle_id, error = %err, "Report rejected");
                    Err(err)
                }
            },
        }
    }

    /// Decode a JSON position report and apply it.
    ///
    /// # Errors
    ///
    /// Will return `Error::InvalidFormat` if the payload is not a position
    /// report, or any error from [`Fleet::observe`].
    pub fn ingest(&self, payload: &[u8]) -> Result<Option<TrackingResult>> {
        let report: PositionReport =
            serde_json::from_slice(payload).context("deserializing position report")?;
        self.observe(&report)
    }

    /// Assign a journey to a vehicle, registering the vehicle if needed.
    ///
    /// Returns the initial placement when the vehicle has already reported.
    ///
    /// # Errors
    ///
    /// Will return `Error::InsufficientStops` if fewer than two of the route's
    /// stops are known. The vehicle then has no journey until a new one is
    /// assigned.
    pub fn assign_journey(
        &self, vehicle_id: &str, route: &[RouteStop],
    ) -> Result<Option<TrackingResult>> {
        let mut tracker = self
            .trackers
            .entry(vehicle_id.to_string())
            .or_insert_with(|| Tracker::new(Arc::clone(&self.config)));
        tracker.init_journey(route, self.stops.as_ref())
    }

    /// Latest placement of a vehicle.
    #[must_use]
    pub fn position(&self, vehicle_id: &str) -> Option<TrackingResult> {
        self.trackers.get(vehicle_id).and_then(|tracker| tracker.position())
    }

    /// Stop tracking a vehicle. Returns whether it was tracked.
    pub fn forget(&self, vehicle_id: &str) -> bool {
        self.trackers.remove(vehicle_id).is_some()
    }

    /// Tracked vehicle ids, sorted.
    #[must_use]
    pub fn vehicles(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.trackers.iter().map(|entry| entry.key().clone()).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Drop vehicles whose newest report is older than `cutoff`. Vehicles
    /// that have a journey but have not reported yet are kept.
    ///
    /// Returns the number of vehicles dropped.
    pub fn prune_silent(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.trackers.len();
        self.trackers.retain(|_, tracker| tracker.last_seen().is_none_or(|seen| seen >= cutoff));
        let pruned = before.saturating_sub(self.trackers.len());
        if pruned > 0 {
            info!(pruned, %cutoff, "Pruned silent vehicles");
        }
        pruned
    }
}
