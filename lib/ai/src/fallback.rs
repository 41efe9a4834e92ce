//! LLM-backed free-form replies.

use crate::backend::LlmBackend;
use crate::error::capability_unavailable;
use crate::llm_call::LlmCall;
use crate::prompt::{self, PromptTemplate};
use async_trait::async_trait;
use rootcause::Report;
use std::collections::HashMap;
use std::sync::Arc;
use tablebot_conversation::{CapabilityError, FallbackResponder};
use tracing::instrument;

const CAPABILITY: &str = "fallback responder";

/// Lets the model continue the conversation when the script has no answer.
pub struct LlmFallbackResponder {
    backend: Arc<dyn LlmBackend>,
    template: PromptTemplate,
}

impl LlmFallbackResponder {
    /// Creates a responder over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            template: prompt::fallback_reply(),
        }
    }
}

impl std::fmt::Debug for LlmFallbackResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmFallbackResponder")
            .field("model", &self.backend.model())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FallbackResponder for LlmFallbackResponder {
    #[instrument(skip_all)]
    async fn reply(&self, history: &str) -> Result<String, Report<CapabilityError>> {
        let vars = HashMap::from([("conversation", history.to_string())]);
        let prompt = self
            .template
            .render(&vars)
            .map_err(|report| CapabilityError::Malformed {
                capability: CAPABILITY,
                reason: report.to_string(),
            })?;

        let mut call = LlmCall::new(prompt);
        if let Some(system) = self.template.render_system_prompt(&vars) {
            call = call.with_system_prompt(system);
        }

        // The reply is shown to the user as-is.
        let result = call
            .invoke(self.backend.as_ref())
            .await
            .map_err(|report| capability_unavailable(CAPABILITY, report))?;
        Ok(result.content)
    }
}
