//! LLM-backed slot extraction.

use crate::backend::LlmBackend;
use crate::error::capability_unavailable;
use crate::llm_call::LlmCall;
use crate::prompt::{self, PromptTemplate};
use async_trait::async_trait;
use rootcause::Report;
use std::collections::HashMap;
use std::sync::Arc;
use tablebot_conversation::{CapabilityError, SlotExtractor, SlotKind};
use tracing::{debug, instrument};

const CAPABILITY: &str = "slot extractor";

/// Replies that mean "the message did not mention it".
const ABSENCE_PREFIXES: [&str; 8] = [
    "there is no",
    "there's no",
    "no ",
    "none",
    "n/a",
    "unknown",
    "null",
    "not ",
];

/// Asks the backend for the value of one slot.
pub struct LlmSlotExtractor {
    backend: Arc<dyn LlmBackend>,
    template: PromptTemplate,
}

impl LlmSlotExtractor {
    /// Creates an extractor over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            template: prompt::extract_slot(),
        }
    }
}

impl std::fmt::Debug for LlmSlotExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSlotExtractor")
            .field("model", &self.backend.model())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SlotExtractor for LlmSlotExtractor {
    #[instrument(skip_all, fields(slot = kind.as_str()))]
    async fn extract(
        &self,
        text: &str,
        kind: SlotKind,
    ) -> Result<String, Report<CapabilityError>> {
        let vars = HashMap::from([
            ("utterance", text.to_string()),
            ("slot", kind.as_str().to_string()),
            ("format", prompt::slot_format(kind).to_string()),
        ]);
        let prompt = self
            .template
            .render(&vars)
            .map_err(|report| CapabilityError::Malformed {
                capability: CAPABILITY,
                reason: report.to_string(),
            })?;

        let mut call = LlmCall::new(prompt).with_temperature(0.0).with_max_tokens(32);
        if let Some(system) = self.template.render_system_prompt(&vars) {
            call = call.with_system_prompt(system);
        }

        let result = call
            .invoke(self.backend.as_ref())
            .await
            .map_err(|report| capability_unavailable(CAPABILITY, report))?;

        let value = normalize_extraction(&result.content);
        debug!(raw = %result.content, %value, "extracted slot");
        Ok(value)
    }
}

/// Turns a model reply into a slot value, or an empty string when the reply
/// says the value is absent.
#[must_use]
pub fn normalize_extraction(reply: &str) -> String {
    let line = reply
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    fn unquoted(text: &str) -> &str {
        text.trim_matches(|c: char| matches!(c, '"' | '\'' | '`'))
            .trim()
    }
    let value = unquoted(line);
    // One sentence-final period; dotted values like "7 p.m." keep theirs.
    let value = match value.strip_suffix('.') {
        Some(head) if !head.contains('.') => unquoted(head),
        _ => value,
    };

    let lowered = value.to_lowercase();
    if ABSENCE_PREFIXES
        .iter()
        .any(|prefix| lowered == prefix.trim_end() || lowered.starts_with(prefix))
    {
        return String::new();
    }

    value.to_string()
}
