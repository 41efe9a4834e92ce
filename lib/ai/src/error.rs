//! Error types for the AI crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `LlmError`: Low-level LLM backend operations
//! - `PromptError`: Prompt template operations
//!
//! Capability implementations translate these into
//! `tablebot_conversation::CapabilityError` at the engine boundary.

use rootcause::Report;
use std::fmt;
use tablebot_conversation::CapabilityError;

/// Errors from LLM backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Provider is unavailable.
    ProviderUnavailable { provider: String, reason: String },
    /// Request failed.
    RequestFailed { reason: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "LLM provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from prompt operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// Missing required variable.
    MissingVariable {
        template: String,
        variable: String,
        description: String,
    },
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable {
                template,
                variable,
                description,
            } => {
                write!(
                    f,
                    "missing required variable '{variable}' ({description}) in template '{template}'"
                )
            }
        }
    }
}

impl std::error::Error for PromptError {}

/// Wraps a failed LLM call as an unavailable capability.
pub(crate) fn capability_unavailable(
    capability: &'static str,
    report: Report<LlmError>,
) -> Report<CapabilityError> {
    let reason = report.current_context().to_string();
    report.context(CapabilityError::Unavailable { capability, reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_display() {
        let err = LlmError::ProviderUnavailable {
            provider: "ollama".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("ollama"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn rate_limit_display() {
        let err = LlmError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 30s");
        assert_eq!(
            LlmError::RateLimited {
                retry_after_secs: None
            }
            .to_string(),
            "rate limited"
        );
    }

    #[test]
    fn prompt_error_display() {
        let err = PromptError::MissingVariable {
            template: "extract_slot".to_string(),
            variable: "slot".to_string(),
            description: "The slot to extract".to_string(),
        };
        assert!(err.to_string().contains("slot"));
        assert!(err.to_string().contains("extract_slot"));
    }
}
