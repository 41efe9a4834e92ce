//! In-memory collaborators for router and session tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use rootcause::Report;
use std::sync::Arc;
use tablebot_conversation::{
    Capabilities, CapabilityError, FallbackResponder, IntentClassifier, SlotExtractor, SlotKind,
};
use tablebot_integration::{HourlyTemperature, Location, WeatherError, WeatherSource};

/// Keyword classifier.
struct KeywordClassifier;

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<String, Report<CapabilityError>> {
        let text = text.to_lowercase();
        let label = if text.contains("book") {
            "book_restaurant"
        } else if text.contains("cancel") {
            "cancel"
        } else if text.contains("hello") {
            "greeting"
        } else if text.contains("open") {
            "restaurant_opening_hours"
        } else {
            "fallback"
        };
        Ok(label.to_string())
    }
}

/// Picks slot values out by shape: "tomorrow", "<n>pm", digits.
struct ShapeExtractor;

#[async_trait]
impl SlotExtractor for ShapeExtractor {
    async fn extract(
        &self,
        text: &str,
        kind: SlotKind,
    ) -> Result<String, Report<CapabilityError>> {
        let mut words = text.split_whitespace();
        let value = match kind {
            SlotKind::Date => words.find(|word| *word == "tomorrow"),
            SlotKind::Time => words.find(|word| word.ends_with("pm")),
            SlotKind::Number => words.find(|word| word.chars().all(|c| c.is_ascii_digit())),
        };
        Ok(value.unwrap_or_default().to_string())
    }
}

struct CannedFallback;

#[async_trait]
impl FallbackResponder for CannedFallback {
    async fn reply(&self, _history: &str) -> Result<String, Report<CapabilityError>> {
        Ok("Let me think about that.".to_string())
    }
}

pub(crate) fn stub_capabilities() -> Capabilities {
    Capabilities::new(
        Arc::new(KeywordClassifier),
        Arc::new(ShapeExtractor),
        Arc::new(CannedFallback),
    )
}

/// Knows Berlin on 2023-02-04 and nothing else.
pub(crate) struct StubWeather;

#[async_trait]
impl WeatherSource for StubWeather {
    async fn search_location(
        &self,
        name: &str,
        _count: u8,
        _language: &str,
    ) -> Result<Vec<Location>, Report<WeatherError>> {
        if name.trim().chars().count() < 2 {
            return Err(WeatherError::InvalidQuery {
                reason: "search term must be at least 2 characters long".to_string(),
            }
            .into());
        }
        if name != "Berlin" {
            return Err(WeatherError::NoResults {
                query: name.to_string(),
            }
            .into());
        }
        Ok(vec![Location {
            name: "Berlin".to_string(),
            latitude: 52.52,
            longitude: 13.41,
        }])
    }

    async fn hourly_temperatures(
        &self,
        _latitude: f64,
        _longitude: f64,
        date: NaiveDate,
    ) -> Result<Vec<HourlyTemperature>, Report<WeatherError>> {
        let day = date.format("%Y-%m-%d").to_string();
        if day != "2023-02-04" {
            return Err(WeatherError::NoDataForDate { date: day }.into());
        }
        Ok(vec![
            HourlyTemperature {
                time: "2023-02-04T00:00".to_string(),
                temperature: 0.9,
            },
            HourlyTemperature {
                time: "2023-02-04T01:00".to_string(),
                temperature: 0.4,
            },
        ])
    }
}
