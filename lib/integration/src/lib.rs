//! External integrations for tablebot.
//!
//! Currently a single one: weather lookups against the Open-Meteo
//! geocoding and forecast APIs, behind the [`WeatherSource`] trait.

pub mod error;
pub mod weather;

pub use error::WeatherError;
pub use weather::{
    HourlyTemperature, Location, WeatherClient, WeatherConfig, WeatherSource, FORECAST_DAYS,
};
