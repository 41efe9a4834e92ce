//! Ollama chat backend.

use crate::backend::{
    retry_after_secs, status_error, transport_error, LlmBackend, LlmBackendConfig, LlmProvider,
    LlmRequest, LlmResponse, TokenUsage,
};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::Client;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Talks to a local Ollama server through `POST /api/chat`.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidConfig` if the HTTP client cannot be built.
    pub fn new(config: &LlmBackendConfig) -> Result<Self, Report<LlmError>> {
        Ok(Self {
            client: config.http_client()?,
            endpoint: format!("{}/api/chat", config.base_url()),
            model: config.model().to_string(),
        })
    }

    fn chat_request<'a>(&'a self, request: &'a LlmRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let options = (request.temperature.is_some() || request.max_tokens.is_some()).then(|| {
            ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            }
        });

        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options,
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, Report<LlmError>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.chat_request(request))
            .send()
            .await
            .map_err(|e| transport_error(LlmProvider::Ollama, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after, &body).into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(LlmProvider::Ollama, e))?;
        let parsed = parse_chat_response(&body)?;
        debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "ollama chat completed"
        );
        Ok(parsed)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    message: ChatResponseMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

fn parse_chat_response(body: &str) -> Result<LlmResponse, LlmError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    Ok(LlmResponse {
        content: response.message.content,
        usage: TokenUsage {
            input_tokens: response.prompt_eval_count,
            output_tokens: response.eval_count,
        },
        model: response.model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OllamaBackend {
        OllamaBackend::new(&LlmBackendConfig::ollama("http://localhost:11434/", "gemma2:2b"))
            .expect("backend")
    }

    #[test]
    fn endpoint_joins_base_url() {
        assert_eq!(backend().endpoint, "http://localhost:11434/api/chat");
    }

    #[test]
    fn chat_request_puts_system_before_prompt() {
        let backend = backend();
        let request = LlmRequest::new("book a table")
            .with_system("You are an intent classifier.")
            .with_temperature(0.0);

        let json = serde_json::to_value(backend.chat_request(&request)).expect("serialize");
        assert_eq!(json["model"], "gemma2:2b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "book a table");
        assert!(json["messages"].get(2).is_none());
        assert_eq!(json["options"]["temperature"], 0.0);
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn options_omitted_when_unset() {
        let backend = backend();
        let request = LlmRequest::new("hello");
        let json = serde_json::to_value(backend.chat_request(&request)).expect("serialize");
        assert!(json.get("options").is_none());
    }

    #[test]
    fn parses_chat_response() {
        let body = r#"{
            "model": "gemma2:2b",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "greeting"},
            "done": true,
            "prompt_eval_count": 42,
            "eval_count": 2
        }"#;

        let response = parse_chat_response(body).expect("parse");
        assert_eq!(response.content, "greeting");
        assert_eq!(response.model, "gemma2:2b");
        assert_eq!(response.usage.total(), 44);
    }

    #[test]
    fn malformed_response_is_parse_failure() {
        let err = parse_chat_response(r#"{"error": "model not found"}"#).expect_err("malformed");
        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }
}
