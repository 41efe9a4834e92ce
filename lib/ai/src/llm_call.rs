//! Single-shot LLM invocation.
//!
//! Every capability in this crate (classification, slot extraction, fallback
//! replies) is one [`LlmCall`]: a rendered prompt and a system prompt sent to
//! the configured backend, timed and logged.

use crate::backend::{LlmBackend, LlmRequest, LlmResponse, TokenUsage};
use crate::error::LlmError;
use chrono::{DateTime, Utc};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};
use ulid::Ulid;

/// Unique identifier for an LLM invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmInvocationId(Ulid);

impl LlmInvocationId {
    /// Creates a new invocation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LlmInvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LlmInvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "llm_{}", self.0)
    }
}

/// Configuration for an LLM Call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallConfig {
    /// The rendered prompt.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Temperature for sampling.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl LlmCallConfig {
    /// Creates a new LLM call configuration.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// The result of an LLM Call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallResult {
    /// Unique identifier for this invocation.
    pub id: LlmInvocationId,
    /// The raw text output.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
    /// When the call was made.
    pub timestamp: DateTime<Utc>,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

impl LlmCallResult {
    /// Creates a result from an LLM response.
    #[must_use]
    pub fn from_response(
        id: LlmInvocationId,
        response: LlmResponse,
        timestamp: DateTime<Utc>,
        latency_ms: u64,
    ) -> Self {
        Self {
            id,
            content: response.content,
            usage: response.usage,
            model: response.model,
            timestamp,
            latency_ms,
        }
    }
}

/// An LLM Call builder.
#[derive(Debug, Clone)]
pub struct LlmCall {
    config: LlmCallConfig,
}

impl LlmCall {
    /// Creates a new LLM Call with the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            config: LlmCallConfig::new(prompt),
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.config.system_prompt = Some(system.into());
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Caps the number of generated tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Builds an LLM request from this configuration.
    #[must_use]
    pub fn build_request(&self) -> LlmRequest {
        let mut request = LlmRequest::new(self.config.prompt.clone());

        if let Some(ref system) = self.config.system_prompt {
            request = request.with_system(system.clone());
        }

        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }

        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        request
    }

    /// Sends the call to `backend`.
    ///
    /// # Errors
    ///
    /// Propagates the backend's `LlmError`.
    pub async fn invoke(
        &self,
        backend: &dyn LlmBackend,
    ) -> Result<LlmCallResult, Report<LlmError>> {
        let id = LlmInvocationId::new();
        let timestamp = Utc::now();
        let started = Instant::now();

        let outcome = backend.generate(&self.build_request()).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(response) => {
                debug!(
                    invocation = %id,
                    provider = %backend.provider(),
                    latency_ms,
                    tokens = response.usage.total(),
                    "LLM call completed"
                );
                Ok(LlmCallResult::from_response(id, response, timestamp, latency_ms))
            }
            Err(report) => {
                warn!(
                    invocation = %id,
                    provider = %backend.provider(),
                    latency_ms,
                    error = %report,
                    "LLM call failed"
                );
                Err(report)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backend shared by this crate's tests.

    use super::*;
    use crate::backend::LlmProvider;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned replies and records the requests it saw.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedBackend {
        replies: Mutex<Vec<Result<String, LlmError>>>,
        pub(crate) seen: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedBackend {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                replies: Mutex::new(vec![Ok(reply.to_string())]),
                seen: Mutex::default(),
            }
        }

        pub(crate) fn failing(error: LlmError) -> Self {
            Self {
                replies: Mutex::new(vec![Err(error)]),
                seen: Mutex::default(),
            }
        }

        pub(crate) fn last_request(&self) -> LlmRequest {
            self.seen
                .lock()
                .expect("lock")
                .last()
                .cloned()
                .expect("a request was sent")
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, Report<LlmError>> {
            self.seen.lock().expect("lock").push(request.clone());
            let reply = self
                .replies
                .lock()
                .expect("lock")
                .pop()
                .unwrap_or_else(|| Ok(String::new()));
            match reply {
                Ok(content) => Ok(LlmResponse {
                    content,
                    usage: TokenUsage::default(),
                    model: "scripted".to_string(),
                }),
                Err(error) => Err(error.into()),
            }
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::Ollama
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;

    #[test]
    fn llm_call_builder() {
        let call = LlmCall::new("Classify this message")
            .with_system_prompt("You are a helpful classifier.")
            .with_temperature(0.3)
            .with_max_tokens(10);

        let request = call.build_request();
        assert_eq!(request.prompt, "Classify this message");
        assert_eq!(
            request.system,
            Some("You are a helpful classifier.".to_string())
        );
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(10));
    }

    #[test]
    fn llm_call_config_serde() {
        let mut config = LlmCallConfig::new("Generate a reply");
        config.system_prompt = Some("Be concise".to_string());

        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: LlmCallConfig = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(config.prompt, parsed.prompt);
        assert_eq!(config.system_prompt, parsed.system_prompt);
    }

    #[test]
    fn invocation_id_display() {
        let id = LlmInvocationId::new();
        assert!(id.to_string().starts_with("llm_"));
    }

    #[tokio::test]
    async fn invoke_returns_backend_content() {
        let backend = ScriptedBackend::replying("greeting");
        let result = LlmCall::new("hello there")
            .invoke(&backend)
            .await
            .expect("call succeeds");

        assert_eq!(result.content, "greeting");
        assert_eq!(result.model, "scripted");
        assert_eq!(backend.last_request().prompt, "hello there");
    }

    #[tokio::test]
    async fn invoke_propagates_failure() {
        let backend = ScriptedBackend::failing(LlmError::Timeout);
        let result = LlmCall::new("hello").invoke(&backend).await;
        assert!(result.is_err());
    }
}
