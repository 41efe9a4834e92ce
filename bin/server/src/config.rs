//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from `TABLEBOT_*` environment variables.
//! Nested keys use `__`, e.g. `TABLEBOT_LLM__PROVIDER=gemini` or
//! `TABLEBOT_BOOKING__AFTER_BOOKING=reset`.
//!
//! See [`LlmBackendConfig`] for the model settings and [`WeatherConfig`]
//! for the Open-Meteo endpoints.

use serde::Deserialize;
use tablebot_ai::LlmBackendConfig;
use tablebot_conversation::BookingPolicy;
use tablebot_integration::WeatherConfig;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Cross-origin settings for the browser client.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Language model backing classification, extraction and fallback.
    #[serde(default)]
    pub llm: LlmBackendConfig,

    /// Booking flow tunables.
    #[serde(default)]
    pub booking: BookingPolicy,

    /// Chat session lifetime.
    #[serde(default)]
    pub session: SessionConfig,

    /// Weather lookups.
    #[serde(default)]
    pub weather: WeatherConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors: CorsConfig::default(),
            llm: LlmBackendConfig::default(),
            booking: BookingPolicy::default(),
            session: SessionConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

/// Cross-origin resource sharing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Minutes without a turn after which a conversation is discarded.
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: u64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_idle_timeout_minutes() -> u64 {
    30
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::with_prefix("TABLEBOT"))
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tablebot_ai::LlmProvider;
    use tablebot_conversation::AfterBooking;

    fn load(vars: &[(&str, &str)]) -> ServerConfig {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ServerConfig::from_environment(
            config::Environment::with_prefix("TABLEBOT").source(Some(source)),
        )
        .expect("valid configuration")
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]);
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.model(), "gemma2:2b");
        assert_eq!(config.booking.after_booking, AfterBooking::CarryOver);
        assert!(config.booking.fill_remaining_from_answer);
    }

    #[test]
    fn nested_keys_override_defaults() {
        let config = load(&[
            ("TABLEBOT_LLM__PROVIDER", "gemini"),
            ("TABLEBOT_LLM__MODEL", "gemini-2.0-flash"),
            ("TABLEBOT_BOOKING__AFTER_BOOKING", "reset"),
            (
                "TABLEBOT_CORS__ALLOWED_ORIGINS",
                "http://localhost:5173,https://tablebot.example",
            ),
            ("TABLEBOT_SESSION__IDLE_TIMEOUT_MINUTES", "5"),
        ]);

        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert_eq!(config.llm.model(), "gemini-2.0-flash");
        assert_eq!(config.booking.after_booking, AfterBooking::Reset);
        assert_eq!(config.cors.allowed_origins.len(), 2);
        assert_eq!(config.session.idle_timeout_minutes, 5);
    }

    #[test]
    fn gemini_without_model_uses_gemini_default() {
        let config = load(&[
            ("TABLEBOT_LLM__PROVIDER", "gemini"),
            ("TABLEBOT_LLM__API_KEY", "secret"),
        ]);

        assert_eq!(config.llm.model(), "gemini-1.5-flash");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout_minutes, 30);
        assert_eq!(config.cleanup_interval_seconds, 300);
    }
}
