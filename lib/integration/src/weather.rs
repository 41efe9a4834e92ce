//! Open-Meteo geocoding and forecast client.

use crate::error::WeatherError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Shortest name the geocoding API accepts.
pub const MIN_QUERY_LEN: usize = 2;

/// Days covered by a forecast request.
pub const FORECAST_DAYS: u8 = 7;

/// Weather client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Geocoding search endpoint.
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    /// Forecast endpoint.
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    /// Optional API key for commercial use.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("geocoding_url", &self.geocoding_url)
            .field("forecast_url", &self.forecast_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Place name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// One hourly forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTemperature {
    /// Local timestamp as reported by the API (`YYYY-MM-DDTHH:MM`).
    pub time: String,
    /// Temperature 2m above ground, in °C.
    pub temperature: f64,
}

/// Location search and hourly temperatures.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Searches for places matching `name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for names shorter than two characters,
    /// `RequestFailed` on transport or HTTP errors, and `NoResults` when the
    /// search matches nothing.
    async fn search_location(
        &self,
        name: &str,
        count: u8,
        language: &str,
    ) -> Result<Vec<Location>, Report<WeatherError>>;

    /// Returns the hourly temperatures forecast for `date` at a position.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport or HTTP errors, `InvalidResponse`
    /// when the hourly series is missing, and `NoDataForDate` when `date` is
    /// outside the forecast window.
    async fn hourly_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<Vec<HourlyTemperature>, Report<WeatherError>>;
}

/// The URL carries the API key, so it is dropped from the message.
fn request_failed(error: reqwest::Error) -> WeatherError {
    WeatherError::RequestFailed {
        reason: error.without_url().to_string(),
    }
}

/// HTTP client for the Open-Meteo APIs.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    config: WeatherConfig,
}

impl WeatherClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` if the HTTP client cannot be built.
    pub fn new(config: WeatherConfig) -> Result<Self, Report<WeatherError>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::RequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, Report<WeatherError>> {
        let mut request = self.client.get(url).query(query);
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("apikey", key)]);
        }

        let response = request.send().await.map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::RequestFailed {
                reason: format!("HTTP {status}: {body}"),
            }
            .into());
        }

        let body = response.text().await.map_err(request_failed)?;
        serde_json::from_str(&body).map_err(|e| {
            WeatherError::InvalidResponse {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    #[instrument(skip(self))]
    async fn search_location(
        &self,
        name: &str,
        count: u8,
        language: &str,
    ) -> Result<Vec<Location>, Report<WeatherError>> {
        let name = validate_query(name)?;
        let response: GeocodingResponse = self
            .get_json(
                &self.config.geocoding_url,
                &[
                    ("name", name.to_string()),
                    ("count", count.to_string()),
                    ("format", "json".to_string()),
                    ("language", language.to_string()),
                ],
            )
            .await?;

        let locations = locations_from(response, name)?;
        debug!(found = locations.len(), "location search completed");
        Ok(locations)
    }

    #[instrument(skip(self))]
    async fn hourly_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<Vec<HourlyTemperature>, Report<WeatherError>> {
        let response: ForecastResponse = self
            .get_json(
                &self.config.forecast_url,
                &[
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("hourly", "temperature_2m".to_string()),
                    ("timezone", "auto".to_string()),
                    ("forecast_days", FORECAST_DAYS.to_string()),
                ],
            )
            .await?;

        let samples = temperatures_on(response, date)?;
        debug!(samples = samples.len(), "forecast lookup completed");
        Ok(samples)
    }
}

fn validate_query(name: &str) -> Result<&str, WeatherError> {
    let name = name.trim();
    if name.chars().count() < MIN_QUERY_LEN {
        return Err(WeatherError::InvalidQuery {
            reason: format!("search term must be at least {MIN_QUERY_LEN} characters long"),
        });
    }
    Ok(name)
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<Location>>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    hourly: Option<HourlySeries>,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Option<Vec<Option<f64>>>,
}

fn locations_from(response: GeocodingResponse, query: &str) -> Result<Vec<Location>, WeatherError> {
    match response.results {
        Some(results) if !results.is_empty() => Ok(results),
        _ => Err(WeatherError::NoResults {
            query: query.to_string(),
        }),
    }
}

fn temperatures_on(
    response: ForecastResponse,
    date: NaiveDate,
) -> Result<Vec<HourlyTemperature>, WeatherError> {
    let hourly = response.hourly.ok_or_else(|| WeatherError::InvalidResponse {
        reason: "missing hourly section".to_string(),
    })?;
    let temperatures = hourly
        .temperature_2m
        .ok_or_else(|| WeatherError::InvalidResponse {
            reason: "missing hourly temperature_2m".to_string(),
        })?;

    let day = date.format("%Y-%m-%d").to_string();
    let samples: Vec<HourlyTemperature> = hourly
        .time
        .into_iter()
        .zip(temperatures)
        .filter(|(time, _)| time.starts_with(&day))
        .filter_map(|(time, temperature)| {
            temperature.map(|temperature| HourlyTemperature { time, temperature })
        })
        .collect();

    if samples.is_empty() {
        return Err(WeatherError::NoDataForDate { date: day });
    }
    Ok(samples)
}
