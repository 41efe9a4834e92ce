//! Domain error types for the HTTP API.
//!
//! Handlers return [`ApiError`]; its `IntoResponse` impl picks the status
//! code and a user-safe message, and logs the detail it hides.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rootcause::Report;
use serde::Serialize;
use std::fmt;
use tablebot_integration::WeatherError;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The chat message was empty after trimming.
    EmptyMessage,
    /// The supplied session id is not a valid id.
    InvalidSessionId { value: String, reason: String },
    /// The weather date is not `YYYY-MM-DD`.
    InvalidDate { value: String },
    /// A weather lookup failed.
    Weather(WeatherError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "message must not be empty"),
            Self::InvalidSessionId { value, reason } => {
                write!(f, "invalid session id '{value}': {reason}")
            }
            Self::InvalidDate { value } => {
                write!(f, "invalid date '{value}', expected YYYY-MM-DD")
            }
            Self::Weather(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<Report<WeatherError>> for ApiError {
    fn from(report: Report<WeatherError>) -> Self {
        Self::Weather(report.current_context().clone())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// User-facing description.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::EmptyMessage | Self::InvalidSessionId { .. } | Self::InvalidDate { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Weather(err) => match err {
                WeatherError::InvalidQuery { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
                WeatherError::NoResults { .. } | WeatherError::NoDataForDate { .. } => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                WeatherError::RequestFailed { .. } | WeatherError::InvalidResponse { .. } => {
                    tracing::error!(error = %err, "weather upstream failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "Weather service unavailable".to_string(),
                    )
                }
            },
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
