//! LLM backend abstraction.
//!
//! Provides a unified interface over the supported providers (local Ollama,
//! Google Gemini). Which one runs is a configuration choice; nothing above
//! this module branches on the provider.

use crate::error::LlmError;
use crate::gemini::GeminiBackend;
use crate::ollama::OllamaBackend;
use async_trait::async_trait;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Available LLM providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Local Ollama instance.
    #[default]
    Ollama,
    /// Google Gemini API.
    Gemini,
}

impl LlmProvider {
    /// Returns the provider name used in logs and errors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Gemini => "gemini",
        }
    }

    /// Returns the model used when none is configured.
    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama => "gemma2:2b",
            Self::Gemini => "gemini-1.5-flash",
        }
    }

    /// Returns the API base URL used when none is configured.
    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::Gemini => "https://generativelanguage.googleapis.com",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for an LLM backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmBackendConfig {
    /// The provider type.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Base URL for the API; the provider default when absent.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model identifier; the provider default when absent.
    #[serde(default)]
    pub model: Option<String>,
    /// API key (required for Gemini).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmBackendConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: None,
            model: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for LlmBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmBackendConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LlmBackendConfig {
    /// Creates an Ollama backend configuration.
    #[must_use]
    pub fn ollama(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Ollama,
            base_url: Some(base_url.into()),
            model: Some(model.into()),
            ..Self::default()
        }
    }

    /// Creates a Gemini backend configuration.
    #[must_use]
    pub fn gemini(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Gemini,
            base_url: None,
            model: Some(model.into()),
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Returns the configured model, or the provider default.
    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(self.provider.default_model())
    }

    /// Returns the configured base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Builds the HTTP client shared by a backend's requests.
    pub(crate) fn http_client(&self) -> Result<reqwest::Client, Report<LlmError>> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| {
                LlmError::InvalidConfig {
                    reason: format!("failed to build HTTP client: {e}"),
                }
                .into()
            })
    }
}

/// A request to an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The prompt, sent as the final user message.
    pub prompt: String,
    /// System prompt, if any.
    pub system: Option<String>,
    /// Temperature for sampling (0.0 - 1.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Creates a new simple request with just a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A response from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Trait for LLM backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generates a response for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the LLM call fails.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, Report<LlmError>>;

    /// Returns the provider type.
    fn provider(&self) -> LlmProvider;

    /// Returns the model name.
    fn model(&self) -> &str;
}

/// Builds the backend selected by `config`.
///
/// # Errors
///
/// Returns `LlmError::InvalidConfig` if the provider is missing settings it
/// needs or the HTTP client cannot be created.
pub fn build_backend(config: &LlmBackendConfig) -> Result<Arc<dyn LlmBackend>, Report<LlmError>> {
    let backend: Arc<dyn LlmBackend> = match config.provider {
        LlmProvider::Ollama => Arc::new(OllamaBackend::new(config)?),
        LlmProvider::Gemini => Arc::new(GeminiBackend::new(config)?),
    };
    tracing::info!(
        provider = %backend.provider(),
        model = backend.model(),
        "LLM backend ready"
    );
    Ok(backend)
}

/// Maps a transport error from `reqwest`.
///
/// The request URL is stripped from the message before it is kept.
pub(crate) fn transport_error(provider: LlmProvider, error: reqwest::Error) -> LlmError {
    let error = error.without_url();
    if error.is_timeout() {
        LlmError::Timeout
    } else if error.is_connect() {
        LlmError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: error.to_string(),
        }
    } else {
        LlmError::RequestFailed {
            reason: error.to_string(),
        }
    }
}

/// Maps a non-success HTTP status and its body.
pub(crate) fn status_error(
    status: reqwest::StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited {
            retry_after_secs: retry_after,
        }
    } else {
        LlmError::RequestFailed {
            reason: format!("HTTP {status}: {body}"),
        }
    }
}

/// Reads the `Retry-After` header as whole seconds.
pub(crate) fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_request_builder() {
        let request = LlmRequest::new("Hello, world!")
            .with_system("You are a helpful assistant.")
            .with_temperature(0.0)
            .with_max_tokens(16);

        assert_eq!(request.prompt, "Hello, world!");
        assert_eq!(
            request.system,
            Some("You are a helpful assistant.".to_string())
        );
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(16));
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn base_url_falls_back_to_provider_default() {
        let config = LlmBackendConfig::gemini("key", "gemini-1.5-flash");
        assert_eq!(config.base_url(), "https://generativelanguage.googleapis.com");

        let config = LlmBackendConfig::ollama("http://ollama:11434/", "gemma2:2b");
        assert_eq!(config.base_url(), "http://ollama:11434");
    }

    #[test]
    fn backend_config_defaults() {
        let config: LlmBackendConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config.provider, LlmProvider::Ollama);
        assert_eq!(config.model(), "gemma2:2b");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn default_model_follows_provider() {
        let config: LlmBackendConfig =
            serde_json::from_str(r#"{"provider": "gemini", "api_key": "k"}"#).expect("deserialize");
        assert_eq!(config.model(), "gemini-1.5-flash");

        let config = LlmBackendConfig {
            model: Some("gemini-2.0-flash".to_string()),
            ..config
        };
        assert_eq!(config.model(), "gemini-2.0-flash");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = LlmBackendConfig::gemini("very-secret-key", "gemini-1.5-flash");
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let err = status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, Some(5), "");
        assert_eq!(
            err,
            LlmError::RateLimited {
                retry_after_secs: Some(5)
            }
        );

        let err = status_error(reqwest::StatusCode::BAD_GATEWAY, None, "upstream down");
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn build_backend_selects_provider() {
        let backend = build_backend(&LlmBackendConfig::ollama("http://localhost:11434", "gemma2:2b"))
            .expect("ollama backend");
        assert_eq!(backend.provider(), LlmProvider::Ollama);
        assert_eq!(backend.model(), "gemma2:2b");

        let missing_key = LlmBackendConfig {
            provider: LlmProvider::Gemini,
            ..LlmBackendConfig::default()
        };
        assert!(build_backend(&missing_key).is_err());
    }
}
