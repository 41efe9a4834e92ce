//! Per-session dialogue state.

use crate::slots::SlotKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the session stands in the booking flow.
///
/// A single enum rather than separate flags, so at most one slot can ever
/// be awaited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "slot", rename_all = "snake_case")]
pub enum SessionState {
    /// No question is outstanding.
    #[default]
    Idle,
    /// The last reply asked for this slot.
    AwaitingSlot(SlotKind),
}

impl SessionState {
    /// Returns the awaited slot, if any.
    #[must_use]
    pub fn pending_slot(&self) -> Option<SlotKind> {
        match self {
            Self::Idle => None,
            Self::AwaitingSlot(kind) => Some(*kind),
        }
    }

    /// Returns true when no slot is awaited.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingSlot(kind) => write!(f, "awaiting_{kind}"),
        }
    }
}

/// Optional facts about the person chatting, supplied by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name used by greeting templates.
    pub name: Option<String>,
}

impl UserProfile {
    /// Creates a profile with a display name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_has_no_pending_slot() {
        assert!(SessionState::Idle.is_idle());
        assert_eq!(SessionState::Idle.pending_slot(), None);
    }

    #[test]
    fn awaiting_exposes_its_slot() {
        let state = SessionState::AwaitingSlot(SlotKind::Time);
        assert!(!state.is_idle());
        assert_eq!(state.pending_slot(), Some(SlotKind::Time));
        assert_eq!(state.to_string(), "awaiting_time");
    }

    #[test]
    fn state_serde_shape() {
        let json = serde_json::to_string(&SessionState::AwaitingSlot(SlotKind::Date))
            .expect("serialize");
        assert_eq!(json, r#"{"state":"awaiting_slot","slot":"date"}"#);
    }
}
