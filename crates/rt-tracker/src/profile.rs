//! # Journey Profile
//!
//! Per-stop geometric and scheduling annotation of a route, built once per
//! vehicle trip and read by all three estimators.
//!
//! For a profile of N entries there are N + 1 logical segments: segment 0 is
//! before the first stop, segment `i` (1..N-1) runs from entry `i - 1` to entry
//! `i`, and segment N is after the last stop.

use tracing::warn;

use crate::Result;
use crate::error::Error;
use crate::geo::{self, Location};
use crate::schedule::{RouteStop, ScheduleTime};
use crate::stops::StopLookup;

/// Annotated route stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry {
    pub stop_id: String,
    pub scheduled_time: ScheduleTime,
    pub location: Location,
    /// Route distance from the first stop, in metres.
    pub distance: f64,
    /// Bearing of the segment ending at this stop.
    pub bearing: f64,
    /// Clockwise turn from `bearing` onto the next segment.
    pub turn: f64,
    /// Outer angle bisector at this stop.
    pub bisector: f64,
}

impl ProfileEntry {
    /// Bearing of the segment leaving this stop.
    #[must_use]
    pub fn outgoing(&self) -> f64 {
        geo::normalize(self.bearing + self.turn)
    }
}

/// Ordered journey annotation. Always holds at least two entries.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyProfile {
    entries: Vec<ProfileEntry>,
}

impl JourneyProfile {
    /// Resolve `route` against `lookup` and annotate each stop.
    ///
    /// Stops missing from the lookup are skipped.
    ///
    /// # Errors
    ///
    /// Will return `Error::InsufficientStops` if fewer than two stops resolve.
    pub fn build(route: &[RouteStop], lookup: &impl StopLookup) -> Result<Self> {
        let mut entries: Vec<ProfileEntry> = Vec::with_capacity(route.len());

        for route_stop in route {
            let Some(stop) = lookup.stop(&route_stop.stop_id) else {
                warn!(stop_id = %route_stop.stop_id, "Stop missing from lookup; skipping");
                continue;
            };

            let location = stop.location();
            let (distance, bearing) = entries.last().map_or((0.0, 0.0), |prev| {
                (prev.distance + prev.location.distance(&location), prev.location.bearing(&location))
            });

            entries.push(ProfileEntry {
                stop_id: route_stop.stop_id.clone(),
                scheduled_time: route_stop.scheduled_time,
                location,
                distance,
                bearing,
                turn: 0.0,
                bisector: 0.0,
            });
        }

        if entries.len() < 2 {
            return Err(Error::InsufficientStops(format!(
                "{} of {} stops resolved",
                entries.len(),
                route.len()
            )));
        }

        // no segment precedes the first stop: orient it like the first segment
        entries[0].bearing = entries[1].bearing;

        let last = entries.len() - 1;
        for i in 0..last {
            let incoming = entries[i].bearing;
            let outgoing = entries[i + 1].bearing;
            entries[i].turn = geo::clockwise(incoming, outgoing);
            entries[i].bisector = outer_bisector(incoming, outgoing);
        }
        entries[last].turn = 0.0;
        entries[last].bisector = geo::normalize(entries[last].bearing + 90.0);

        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[ProfileEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> &ProfileEntry {
        &self.entries[index]
    }

    /// Number of stops, N.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of logical segments, N + 1.
    #[must_use]
    pub fn segments(&self) -> usize {
        self.entries.len() + 1
    }

    /// Index of the "after the last stop" segment, N.
    #[must_use]
    pub fn last_segment(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn first(&self) -> &ProfileEntry {
        &self.entries[0]
    }

    #[must_use]
    pub fn last(&self) -> &ProfileEntry {
        &self.entries[self.entries.len() - 1]
    }

    #[must_use]
    pub fn start_time(&self) -> ScheduleTime {
        self.first().scheduled_time
    }

    #[must_use]
    pub fn end_time(&self) -> ScheduleTime {
        self.last().scheduled_time
    }

    /// Route length in metres.
    #[must_use]
    pub fn total_distance(&self) -> f64 {
        self.last().distance
    }

    /// Whether `segment` lies between two stops.
    #[must_use]
    pub fn is_interior(&self, segment: usize) -> bool {
        segment >= 1 && segment < self.entries.len()
    }

    /// Stops bounding an interior segment.
    #[must_use]
    pub fn endpoints(&self, segment: usize) -> Option<(&ProfileEntry, &ProfileEntry)> {
        self.is_interior(segment).then(|| (&self.entries[segment - 1], &self.entries[segment]))
    }

    /// Length of an interior segment in metres, 0 otherwise.
    #[must_use]
    pub fn segment_length(&self, segment: usize) -> f64 {
        self.endpoints(segment).map_or(0.0, |(start, end)| end.distance - start.distance)
    }

    /// Route distance at `fraction` of the way along `segment`.
    #[must_use]
    pub fn route_distance(&self, segment: usize, fraction: f64) -> f64 {
        match self.endpoints(segment) {
            Some((start, end)) => {
                start.distance + fraction.clamp(0.0, 1.0) * (end.distance - start.distance)
            }
            None if segment == 0 => 0.0,
            None => self.total_distance(),
        }
    }
}

/// Bearing that splits the reflex angle between the reversed `incoming` and
/// the `outgoing` bearing. A straight-through stop yields `incoming + 90`.
fn outer_bisector(incoming: f64, outgoing: f64) -> f64 {
    let reversed = geo::normalize(incoming + 180.0);
    let span = geo::clockwise(outgoing, reversed);
    if span < 180.0 {
        // reflex angle runs clockwise from reversed to outgoing
        geo::normalize(reversed + (360.0 - span) / 2.0)
    } else {
        geo::normalize(outgoing + span / 2.0)
    }
}
