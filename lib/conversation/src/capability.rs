//! Capabilities the dialogue engine delegates to.
//!
//! The engine never classifies or extracts anything itself. These traits
//! are implemented by the LLM-backed collaborators in `tablebot-ai`, and by
//! in-memory fakes in tests.

use crate::error::CapabilityError;
use crate::slots::SlotKind;
use async_trait::async_trait;
use rootcause::Report;
use std::sync::Arc;

/// Maps an utterance to an intent label.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classifies `text`.
    ///
    /// The label may fall outside the known intent set; the engine treats
    /// that as a fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing service fails.
    async fn classify(&self, text: &str) -> Result<String, Report<CapabilityError>>;
}

/// Pulls the value of one slot out of an utterance.
#[async_trait]
pub trait SlotExtractor: Send + Sync {
    /// Extracts `kind` from `text`, returning an empty string when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing service fails.
    async fn extract(&self, text: &str, kind: SlotKind)
    -> Result<String, Report<CapabilityError>>;
}

/// Produces free-form replies when nothing is scripted.
#[async_trait]
pub trait FallbackResponder: Send + Sync {
    /// Answers given the rendered conversation, current utterance last.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing service fails.
    async fn reply(&self, history: &str) -> Result<String, Report<CapabilityError>>;
}

/// The set of collaborators an engine runs with.
#[derive(Clone)]
pub struct Capabilities {
    /// Intent classifier.
    pub classifier: Arc<dyn IntentClassifier>,
    /// Slot extractor.
    pub extractor: Arc<dyn SlotExtractor>,
    /// Free-form fallback.
    pub fallback: Arc<dyn FallbackResponder>,
}

impl Capabilities {
    /// Bundles the three collaborators.
    #[must_use]
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        extractor: Arc<dyn SlotExtractor>,
        fallback: Arc<dyn FallbackResponder>,
    ) -> Self {
        Self {
            classifier,
            extractor,
            fallback,
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
