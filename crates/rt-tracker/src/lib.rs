//! # Real-time Tracker
//!
//! Estimates which segment of a timetabled route a vehicle is on, and how far
//! along that segment it is, from a stream of GPS position reports.
//!
//! Three independent estimators each produce a probability over the route's
//! segments:
//!
//! - [`distance`] from proximity to the route geometry,
//! - [`progress`] from plausible forward movement since the previous report,
//! - [`timetable`] from the scheduled times at each stop.
//!
//! A [`Tracker`] fuses them with context-dependent [`weights`] and keeps the
//! most probable placement per vehicle.

mod config;
mod error;
mod report;
mod stops;
mod tracker;

pub mod distance;
pub mod geo;
pub mod probability;
pub mod profile;
pub mod progress;
pub mod schedule;
pub mod timetable;
pub mod weights;

pub use self::config::Config;
pub use self::error::Error;
pub use self::geo::Location;
pub use self::probability::{Distribution, combine};
pub use self::profile::{JourneyProfile, ProfileEntry};
pub use self::report::{Fix, PositionReport};
pub use self::schedule::{RouteStop, ScheduleTime};
pub use self::stops::{Stop, StopCache, StopLookup};
pub use self::tracker::{Estimates, State, Tracker, TrackingResult, progress_fraction};
pub use self::weights::Weights;

/// Result type for tracker operations.
pub type Result<T> = anyhow::Result<T, Error>;
