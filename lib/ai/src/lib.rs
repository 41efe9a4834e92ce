//! LLM collaborators for the tablebot dialogue engine.
//!
//! Everything here sits behind one primitive, the **LLM Call**: a single
//! prompt sent to the configured [`LlmBackend`]. The dialogue capabilities
//! are LLM Calls with specialized prompts:
//!
//! - [`LlmIntentClassifier`]: utterance to intent label
//! - [`LlmSlotExtractor`]: utterance to the value of one booking slot
//! - [`LlmFallbackResponder`]: conversation to a free-form reply

pub mod backend;
pub mod classify;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod gemini;
pub mod llm_call;
pub mod ollama;
pub mod prompt;

pub use backend::{
    build_backend, LlmBackend, LlmBackendConfig, LlmProvider, LlmRequest, LlmResponse,
    TokenUsage,
};
pub use classify::LlmIntentClassifier;
pub use error::{LlmError, PromptError};
pub use extract::{normalize_extraction, LlmSlotExtractor};
pub use fallback::LlmFallbackResponder;
pub use gemini::GeminiBackend;
pub use llm_call::{LlmCall, LlmCallConfig, LlmCallResult, LlmInvocationId};
pub use ollama::OllamaBackend;

use std::sync::Arc;
use tablebot_conversation::Capabilities;

/// Wires all three dialogue capabilities to one backend.
#[must_use]
pub fn capabilities(backend: Arc<dyn LlmBackend>) -> Capabilities {
    Capabilities::new(
        Arc::new(LlmIntentClassifier::new(Arc::clone(&backend))),
        Arc::new(LlmSlotExtractor::new(Arc::clone(&backend))),
        Arc::new(LlmFallbackResponder::new(backend)),
    )
}
