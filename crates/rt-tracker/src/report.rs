use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::Error;
use crate::geo::Location;
use crate::schedule;

/// Position report as delivered by the real-time feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    /// Vehicle the report belongs to.
    pub vehicle_id: String,

    /// Reported latitude.
    pub latitude: f64,

    /// Reported longitude.
    pub longitude: f64,

    /// ISO-8601 time the position was recorded.
    pub recorded_time: String,

    /// Line the vehicle is signed on to (display only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,

    /// Heading reported by the vehicle (display only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
}

impl PositionReport {
    #[must_use]
    pub fn new(
        vehicle_id: impl Into<String>, latitude: f64, longitude: f64,
        recorded_time: impl Into<String>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            latitude,
            longitude,
            recorded_time: recorded_time.into(),
            line: None,
            bearing: None,
        }
    }

    /// Validate the report and extract the fix used by the estimators.
    ///
    /// # Errors
    ///
    /// Will return `Error::InvalidReport` if the coordinates are not finite or
    /// out of range, or the recorded time cannot be parsed.
    pub fn fix(&self) -> Result<Fix> {
        let location = Location::new(self.latitude, self.longitude);
        if !location.is_finite() {
            return Err(Error::InvalidReport(format!(
                "non-finite coordinates ({}, {})",
                self.latitude, self.longitude
            )));
        }
        if self.latitude.abs() > 90.0 || self.longitude.abs() > 180.0 {
            return Err(Error::InvalidReport(format!(
                "coordinates out of range ({}, {})",
                self.latitude, self.longitude
            )));
        }

        let recorded_at = schedule::parse_timestamp(&self.recorded_time)?;
        Ok(Fix { location, recorded_at })
    }
}

/// A validated position at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub location: Location,
    pub recorded_at: DateTime<Utc>,
}

impl Fix {
    /// Seconds elapsed since `earlier`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds_since(&self, earlier: &Self) -> f64 {
        (self.recorded_at - earlier.recorded_at).num_milliseconds() as f64 / 1000.0
    }
}
