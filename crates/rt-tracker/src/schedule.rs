//! Scheduled times and route-local clock handling.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

// A route starting after this time may run past midnight.
const LATE_SERVICE_START: i64 = 20 * 60 * 60;
// Fixes before this local time may still belong to the previous service day.
const SERVICE_DAY_ROLLOVER: i64 = 4 * 60 * 60;

/// Time of day as seconds since midnight of the service day.
///
/// Parsed from `HH:MM:SS`. Hours may exceed 23 for trips that run past
/// midnight, as in GTFS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleTime(i64);

impl ScheduleTime {
    #[must_use]
    pub const fn from_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    #[must_use]
    pub const fn hms(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self((hours * 60 + minutes) * 60 + seconds)
    }

    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.0
    }
}

impl FromStr for ScheduleTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = || -> anyhow::Result<Self> {
            let mut parts = s.trim().split(':');
            let mut field = |name: &str| -> anyhow::Result<i64> {
                let value = parts.next().ok_or_else(|| anyhow!("missing {name}"))?;
                value.parse::<i64>().with_context(|| format!("parsing {name} `{value}`"))
            };
            let hours = field("hours")?;
            let minutes = field("minutes")?;
            let seconds = field("seconds")?;
            if parts.next().is_some() {
                return Err(anyhow!("trailing fields"));
            }
            if hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
                return Err(anyhow!("field out of range"));
            }
            Ok(Self::hms(hours, minutes, seconds))
        };

        parse().with_context(|| format!("invalid schedule time `{s}`")).map_err(Into::into)
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3_600;
        let minutes = (self.0 % 3_600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl Serialize for ScheduleTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ScheduleTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// One timetabled stop of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    /// Reference resolved through the stop lookup.
    pub stop_id: String,
    /// Scheduled time of day at this stop.
    pub scheduled_time: ScheduleTime,
}

impl RouteStop {
    #[must_use]
    pub fn new(stop_id: impl Into<String>, scheduled_time: ScheduleTime) -> Self {
        Self { stop_id: stop_id.into(), scheduled_time }
    }
}

/// Parses an ISO-8601 timestamp carrying an offset.
///
/// # Errors
///
/// Returns `Error::InvalidReport` when the text is not an RFC 3339 timestamp.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| Error::InvalidReport(format!("invalid timestamp `{value}`: {err}")))
}

/// Seconds since local midnight of `timestamp` in `tz`.
#[must_use]
pub fn local_seconds(timestamp: DateTime<Utc>, tz: Tz) -> i64 {
    i64::from(timestamp.with_timezone(&tz).num_seconds_from_midnight())
}

/// Expresses `timestamp` on the service day of a journey starting at
/// `journey_start`.
///
/// Early-morning fixes for a journey that starts late in the evening, or at
/// 24:00 or later, are moved past 24:00 so they compare directly with
/// extended schedule times.
#[must_use]
pub fn service_seconds(timestamp: DateTime<Utc>, tz: Tz, journey_start: ScheduleTime) -> i64 {
    let local = local_seconds(timestamp, tz);
    let start = journey_start.seconds();
    if local < SERVICE_DAY_ROLLOVER && start >= LATE_SERVICE_START {
        local + SECS_PER_DAY
    } else {
        local
    }
}
