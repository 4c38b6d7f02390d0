//! # Tracker Errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the estimator. None of them are fatal: the worst outcome
/// is that no estimate is available for the vehicle yet.
#[derive(Error, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    /// Fewer than two stops of the route resolved against the stop lookup.
    #[error("code: insufficient_stops, description: {0}")]
    InsufficientStops(String),

    /// The position report has non-finite coordinates or an unparseable
    /// timestamp.
    #[error("code: invalid_report, description: {0}")]
    InvalidReport(String),

    /// A route, stop or report payload could not be decoded.
    #[error("code: invalid_format, description: {0}")]
    InvalidFormat(String),

    /// An update arrived before a journey profile was assigned.
    #[error("code: no_journey")]
    NoJourney,
}

impl Error {
    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &str {
        match self {
            Self::InsufficientStops(_) => "insufficient_stops",
            Self::InvalidReport(_) => "invalid_report",
            Self::InvalidFormat(_) => "invalid_format",
            Self::NoJourney => "no_journey",
        }
    }

    /// Returns the error description.
    #[must_use]
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::InsufficientStops(e)) => Self::InsufficientStops(format!("{err}: {e}")),
            Some(Self::InvalidReport(e)) => Self::InvalidReport(format!("{err}: {e}")),
            Some(Self::InvalidFormat(e)) => Self::InvalidFormat(format!("{err}: {e}")),
            Some(Self::NoJourney) => Self::NoJourney,
            None => {
                let stack = err.chain().fold(String::new(), |cause, e| format!("{cause} -> {e}"));
                let stack = stack.trim_start_matches(" -> ").to_string();
                Self::InvalidFormat(stack)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}
