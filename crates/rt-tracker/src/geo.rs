//! Spherical geometry on WGS84 coordinates.
//!
//! Distances are haversine metres on the mean earth sphere. Bearings are
//! degrees clockwise from north in `[0, 360)`.

use ::geo::{Bearing, Coord, CrossTrackDistance, Distance, Haversine, Point};

/// A point on the earth's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location(Point);

impl Location {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self(Point(Coord { x: longitude, y: latitude }))
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.0.0.y
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.0.0.x
    }

    #[must_use]
    pub const fn point(&self) -> Point {
        self.0
    }

    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.latitude().is_finite() && self.longitude().is_finite()
    }

    /// Great-circle distance to `other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        Haversine::distance(self.0, other.0)
    }

    /// Initial bearing of the great circle from this point to `other`.
    #[must_use]
    pub fn bearing(&self, other: &Self) -> f64 {
        normalize(Haversine::bearing(self.0, other.0))
    }

    /// Perpendicular distance to the great circle through `start` and `end`.
    ///
    /// Falls back to the distance to `start` when the two ends coincide.
    #[must_use]
    pub fn cross_track(&self, start: &Self, end: &Self) -> f64 {
        if start.distance(end) < f64::EPSILON {
            return start.distance(self);
        }
        self.0.cross_track_distance(&start.0, &end.0)
    }
}

impl From<Point> for Location {
    fn from(point: Point) -> Self {
        Self(point)
    }
}

/// Wraps an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Clockwise angle turned when going from bearing `from` to bearing `to`.
#[must_use]
pub fn clockwise(from: f64, to: f64) -> f64 {
    normalize(to - from)
}

/// Absolute angular separation of two bearings, in `[0, 180]`.
#[must_use]
pub fn separation(a: f64, b: f64) -> f64 {
    let cw = clockwise(a, b);
    cw.min(360.0 - cw)
}

/// Whether `bearing` lies on the shorter arc between `a` and `b` (inclusive).
#[must_use]
pub fn within_arc(a: f64, b: f64, bearing: f64) -> bool {
    let span = clockwise(a, b);
    if span <= 180.0 {
        clockwise(a, bearing) <= span
    } else {
        clockwise(b, bearing) <= 360.0 - span
    }
}
