use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo::Location;

/// Stop reference data, owned by the host's stop cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

impl Stop {
    #[must_use]
    pub fn new(stop_id: impl Into<String>, stop_lat: f64, stop_lon: f64) -> Self {
        Self { stop_id: stop_id.into(), stop_lat, stop_lon }
    }

    #[must_use]
    pub const fn location(&self) -> Location {
        Location::new(self.stop_lat, self.stop_lon)
    }
}

/// Resolves stop references to stop locations.
///
/// Implementations are expected to be pre-populated by the host: the journey
/// builder never triggers a fetch.
pub trait StopLookup {
    /// Returns the stop for `stop_id`, if known.
    fn stop(&self, stop_id: &str) -> Option<Stop>;
}

impl StopLookup for HashMap<String, Stop> {
    fn stop(&self, stop_id: &str) -> Option<Stop> {
        self.get(stop_id).cloned()
    }
}

/// In-memory stop cache.
#[derive(Debug, Clone, Default)]
pub struct StopCache {
    stops: HashMap<String, Stop>,
}

impl StopCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a stop.
    pub fn insert(&mut self, stop: Stop) {
        self.stops.insert(stop.stop_id.clone(), stop);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    #[must_use]
    pub fn contains(&self, stop_id: &str) -> bool {
        self.stops.contains_key(stop_id)
    }
}

impl Extend<Stop> for StopCache {
    fn extend<T: IntoIterator<Item = Stop>>(&mut self, iter: T) {
        for stop in iter {
            self.insert(stop);
        }
    }
}

impl FromIterator<Stop> for StopCache {
    fn from_iter<T: IntoIterator<Item = Stop>>(iter: T) -> Self {
        let mut cache = Self::new();
        cache.extend(iter);
        cache
    }
}

impl StopLookup for StopCache {
    fn stop(&self, stop_id: &str) -> Option<Stop> {
        self.stops.get(stop_id).cloned()
    }
}
