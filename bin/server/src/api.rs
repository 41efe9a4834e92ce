//! HTTP routes.

use crate::config::CorsConfig;
use crate::error::ApiError;
use crate::session::SessionRegistry;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderValue,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tablebot_core::SessionId;
use tablebot_integration::{HourlyTemperature, Location, WeatherError, WeatherSource};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

/// Shared application state.
pub struct AppState {
    /// Live chat sessions.
    pub sessions: SessionRegistry,
    /// Weather lookups.
    pub weather: Arc<dyn WeatherSource>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(sessions: SessionRegistry, weather: Arc<dyn WeatherSource>) -> Self {
        Self { sessions, weather }
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/api/data", post(chat))
        .route("/api/weather", get(weather))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers are mirrored.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Body of `POST /api/data`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// What the user said.
    pub message: String,
    /// Conversation to continue; a new one is started when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Display name for greetings.
    #[serde(default)]
    pub name: Option<String>,
}

/// Reply to `POST /api/data`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// What the bot says.
    pub message: String,
    /// Conversation to send with the next message.
    pub session_id: String,
}

/// Runs one dialogue turn.
#[instrument(skip_all)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let session_id = request
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.parse::<SessionId>()
                .map_err(|e| ApiError::InvalidSessionId {
                    value: raw.to_string(),
                    reason: e.reason,
                })
        })
        .transpose()?;

    let (session_id, entry) = state.sessions.get_or_create(session_id).await;
    let mut entry = entry.lock().await;
    if let Some(name) = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        entry.engine.set_user_name(name);
    }

    let reply = entry.engine.handle_turn(message).await;
    entry.touch();
    info!(session = %session_id, state = %entry.engine.state(), "chat turn completed");

    Ok(Json(ChatResponse {
        message: reply,
        session_id: session_id.to_string(),
    }))
}

/// Query of `GET /api/weather`.
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    /// Place name or postal code.
    pub location: String,
    /// Day of interest, `YYYY-MM-DD`.
    pub date: String,
    /// Language for place names.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// Reply to `GET /api/weather`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherResponse {
    /// The best matching place.
    pub location: Location,
    /// Hourly temperatures for the requested day.
    pub temperatures: Vec<HourlyTemperature>,
}

/// Looks up the hourly temperatures for a place and day.
#[instrument(skip(state))]
pub async fn weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let date = NaiveDate::parse_from_str(query.date.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::InvalidDate {
            value: query.date.clone(),
        }
    })?;

    let location = state
        .weather
        .search_location(&query.location, 1, &query.language)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ApiError::Weather(WeatherError::NoResults {
                query: query.location.clone(),
            })
        })?;

    let temperatures = state
        .weather
        .hourly_temperatures(location.latitude, location.longitude, date)
        .await?;

    Ok(Json(WeatherResponse {
        location,
        temperatures,
    }))
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}
