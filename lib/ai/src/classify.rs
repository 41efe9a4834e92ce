//! LLM-backed intent classification.

use crate::backend::LlmBackend;
use crate::error::capability_unavailable;
use crate::llm_call::LlmCall;
use crate::prompt::{self, PromptTemplate};
use async_trait::async_trait;
use rootcause::Report;
use std::collections::HashMap;
use std::sync::Arc;
use tablebot_conversation::{CapabilityError, IntentClassifier};
use tracing::{debug, instrument};

const CAPABILITY: &str = "intent classifier";

/// Asks the backend for one intent label per utterance.
pub struct LlmIntentClassifier {
    backend: Arc<dyn LlmBackend>,
    template: PromptTemplate,
}

impl LlmIntentClassifier {
    /// Creates a classifier over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            template: prompt::classify_intent(),
        }
    }
}

impl std::fmt::Debug for LlmIntentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmIntentClassifier")
            .field("model", &self.backend.model())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    #[instrument(skip_all)]
    async fn classify(&self, text: &str) -> Result<String, Report<CapabilityError>> {
        let vars = HashMap::from([("utterance", text.to_string())]);
        let prompt = self
            .template
            .render(&vars)
            .map_err(|report| CapabilityError::Malformed {
                capability: CAPABILITY,
                reason: report.to_string(),
            })?;

        let mut call = LlmCall::new(prompt).with_temperature(0.0).with_max_tokens(16);
        if let Some(system) = self.template.render_system_prompt(&vars) {
            call = call.with_system_prompt(system);
        }

        let result = call
            .invoke(self.backend.as_ref())
            .await
            .map_err(|report| capability_unavailable(CAPABILITY, report))?;

        let label = parse_label(&result.content);
        debug!(raw = %result.content, %label, "classified utterance");
        Ok(label)
    }
}

/// Reduces a model reply to a bare label.
///
/// Models often wrap the label ("Intent: greeting.", "`book_restaurant`");
/// only the first word of the first non-empty line is kept.
#[must_use]
pub fn parse_label(reply: &str) -> String {
    let line = reply
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let lowered = line.to_lowercase();
    let without_prefix = lowered
        .strip_prefix("intent:")
        .unwrap_or(&lowered)
        .trim_start();

    without_prefix
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| !(c.is_alphanumeric() || c == '_'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm_call::testing::ScriptedBackend;

    #[test]
    fn parse_label_strips_decoration() {
        assert_eq!(parse_label("greeting"), "greeting");
        assert_eq!(parse_label("  Book_Restaurant\n"), "book_restaurant");
        assert_eq!(parse_label("Intent: cancel."), "cancel");
        assert_eq!(parse_label("`help`"), "help");
        assert_eq!(parse_label("\n\nyes - the user agrees"), "yes");
        assert_eq!(parse_label(""), "");
    }

    #[tokio::test]
    async fn sends_utterance_with_intent_list() {
        let backend = Arc::new(ScriptedBackend::replying("restaurant_opening_hours"));
        let classifier = LlmIntentClassifier::new(backend.clone());

        let label = classifier
            .classify("when are you open?")
            .await
            .expect("classified");

        assert_eq!(label, "restaurant_opening_hours");
        let request = backend.last_request();
        assert_eq!(request.prompt, "when are you open?");
        let system = request.system.expect("system prompt");
        assert!(system.contains("- book_restaurant"));
        assert_eq!(request.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn backend_failure_is_unavailable() {
        let backend = Arc::new(ScriptedBackend::failing(LlmError::Timeout));
        let classifier = LlmIntentClassifier::new(backend);

        assert!(classifier.classify("hello").await.is_err());
    }
}
