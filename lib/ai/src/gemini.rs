//! Google Gemini `generateContent` backend.

use crate::backend::{
    retry_after_secs, status_error, transport_error, LlmBackend, LlmBackendConfig, LlmProvider,
    LlmRequest, LlmResponse, TokenUsage,
};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Calls the Gemini REST API with an API key.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidConfig` when no API key is configured or the
    /// HTTP client cannot be built.
    pub fn new(config: &LlmBackendConfig) -> Result<Self, Report<LlmError>> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LlmError::InvalidConfig {
                reason: "gemini requires an API key".to_string(),
            })?;

        Ok(Self {
            client: config.http_client()?,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url(),
                config.model()
            ),
            api_key: api_key.to_string(),
            model: config.model().to_string(),
        })
    }

    /// Builds the HTTP request; the key goes in a header, never the URL.
    fn http_request(&self, request: &LlmRequest) -> RequestBuilder {
        self.client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.generate_request(request))
    }

    fn generate_request<'a>(&self, request: &'a LlmRequest) -> GenerateRequest<'a> {
        let system_instruction = request.system.as_deref().map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        });

        let contents = vec![Content {
            role: Some("user"),
            parts: vec![Part {
                text: &request.prompt,
            }],
        }];

        let generation_config = (request.temperature.is_some() || request.max_tokens.is_some())
            .then(|| GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            });

        GenerateRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, Report<LlmError>> {
        let response = self
            .http_request(request)
            .send()
            .await
            .map_err(|e| transport_error(LlmProvider::Gemini, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after, &body).into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(LlmProvider::Gemini, e))?;
        let parsed = parse_generate_response(&body, &self.model)?;
        debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "gemini generation completed"
        );
        Ok(parsed)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

fn parse_generate_response(body: &str, model: &str) -> Result<LlmResponse, LlmError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .ok_or_else(|| LlmError::ResponseParseFailed {
            reason: "no candidates in response".to_string(),
        })?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<String>();

    let usage = response
        .usage_metadata
        .map(|usage| TokenUsage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        usage,
        model: response.model_version.unwrap_or_else(|| model.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> GeminiBackend {
        GeminiBackend::new(&LlmBackendConfig::gemini("test-key", "gemini-1.5-flash"))
            .expect("backend")
    }

    #[test]
    fn endpoint_names_model() {
        assert_eq!(
            backend().endpoint,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn blank_api_key_is_invalid_config() {
        let config = LlmBackendConfig::gemini("  ", "gemini-1.5-flash");
        assert!(GeminiBackend::new(&config).is_err());
    }

    #[test]
    fn request_uses_camel_case() {
        let backend = backend();
        let request = LlmRequest::new("What time?")
            .with_system("Extract the time.")
            .with_max_tokens(8);

        let json = serde_json::to_value(backend.generate_request(&request)).expect("serialize");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Extract the time.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What time?");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8);
    }

    #[test]
    fn api_key_is_sent_as_header_not_query() {
        let request = backend()
            .http_request(&LlmRequest::new("hi"))
            .build()
            .expect("request");

        assert!(request.url().query().is_none());
        assert!(!request.url().as_str().contains("test-key"));
        assert_eq!(
            request
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|value| value.to_str().ok()),
            Some("test-key")
        );
        assert!(!format!("{:?}", backend()).contains("test-key"));
    }

    #[tokio::test]
    async fn transport_failure_does_not_leak_api_key() {
        let config = LlmBackendConfig {
            base_url: Some("http://127.0.0.1:1".to_string()),
            ..LlmBackendConfig::gemini("leaky-key", "gemini-1.5-flash")
        };
        let backend = GeminiBackend::new(&config).expect("backend");

        let report = backend
            .generate(&LlmRequest::new("hi"))
            .await
            .expect_err("nothing listens on port 1");

        assert!(!report.to_string().contains("leaky-key"));
    }

    #[test]
    fn parses_candidates_and_usage() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "7pm"}, {"text": ""}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 30, "candidatesTokenCount": 2, "totalTokenCount": 32},
            "modelVersion": "gemini-1.5-flash-002"
        }"#;

        let response = parse_generate_response(body, "gemini-1.5-flash").expect("parse");
        assert_eq!(response.content, "7pm");
        assert_eq!(response.model, "gemini-1.5-flash-002");
        assert_eq!(response.usage.total(), 32);
    }

    #[test]
    fn empty_candidates_is_parse_failure() {
        let err = parse_generate_response(r#"{"candidates": []}"#, "gemini-1.5-flash")
            .expect_err("no candidates");
        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }
}
