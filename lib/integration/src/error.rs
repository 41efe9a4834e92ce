//! Error types for the integration crate.

use std::fmt;

/// Errors from weather lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// The query was rejected before any request was made.
    InvalidQuery { reason: String },
    /// The upstream service could not be reached or answered with an error.
    RequestFailed { reason: String },
    /// The upstream answer did not have the expected shape.
    InvalidResponse { reason: String },
    /// The location search matched nothing.
    NoResults { query: String },
    /// The forecast holds no samples for the requested day.
    NoDataForDate { date: String },
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery { reason } => write!(f, "invalid weather query: {reason}"),
            Self::RequestFailed { reason } => write!(f, "weather request failed: {reason}"),
            Self::InvalidResponse { reason } => {
                write!(f, "invalid weather response: {reason}")
            }
            Self::NoResults { query } => write!(f, "no locations found for '{query}'"),
            Self::NoDataForDate { date } => {
                write!(f, "no data available for the given date: {date}")
            }
        }
    }
}

impl std::error::Error for WeatherError {}
