//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `DialogueError`: script wiring problems detected at construction
//! - `TemplateError`: response rendering failures
//! - `CapabilityError`: failures reported by classifier, extractor or
//!   fallback collaborators
//!
//! None of these reach the end user. The engine absorbs capability and
//! render failures, and a `DialogueError` stops startup.

use crate::intent::Intent;
use crate::slots::SlotKind;
use std::fmt;

/// Errors from building a dialogue script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueError {
    /// An intent the engine dispatches on has no route.
    Unrouted { intent: Intent },
    /// An intent is routed to a node that was never registered.
    MissingNode { intent: Intent, node: String },
    /// A node the engine renders directly has no template for the intent.
    MissingResponse { node: String, intent: Intent },
}

impl fmt::Display for DialogueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrouted { intent } => write!(f, "intent '{intent}' has no route"),
            Self::MissingNode { intent, node } => {
                write!(f, "intent '{intent}' is routed to unknown node '{node}'")
            }
            Self::MissingResponse { node, intent } => {
                write!(f, "node '{node}' has no response for intent '{intent}'")
            }
        }
    }
}

impl std::error::Error for DialogueError {}

/// Errors from rendering a response template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A required slot placeholder had no value (an incomplete booking).
    MissingRequired { slot: SlotKind },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { slot } => {
                write!(f, "incomplete booking: no value for required slot '{slot}'")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Errors reported by an external capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The backing service could not be reached or refused the request.
    Unavailable { capability: &'static str, reason: String },
    /// The service answered with something that could not be used.
    Malformed { capability: &'static str, reason: String },
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { capability, reason } => {
                write!(f, "{capability} unavailable: {reason}")
            }
            Self::Malformed { capability, reason } => {
                write!(f, "{capability} returned a malformed reply: {reason}")
            }
        }
    }
}

impl std::error::Error for CapabilityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialogue_error_display() {
        let err = DialogueError::MissingNode {
            intent: Intent::Help,
            node: "information".to_string(),
        };
        assert!(err.to_string().contains("help"));
        assert!(err.to_string().contains("information"));
    }

    #[test]
    fn template_error_display() {
        let err = TemplateError::MissingRequired {
            slot: SlotKind::Time,
        };
        assert!(err.to_string().contains("incomplete booking"));
        assert!(err.to_string().contains("time"));
    }

    #[test]
    fn capability_error_display() {
        let err = CapabilityError::Unavailable {
            capability: "intent classifier",
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("intent classifier"));
        assert!(err.to_string().contains("connection refused"));
    }
}
