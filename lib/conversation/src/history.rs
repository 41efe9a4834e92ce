//! Conversation history used as fallback context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tablebot_core::TurnId;

/// Who said something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The person chatting.
    User,
    /// The dialogue engine.
    Bot,
}

impl Speaker {
    /// The tag used when rendering history for a language model.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Bot => "Bot",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One utterance in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn identifier.
    pub id: TurnId,
    /// Who spoke.
    pub speaker: Speaker,
    /// What was said, verbatim.
    pub text: String,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn stamped with the current time.
    #[must_use]
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only record of everything said in a session.
///
/// Never pruned: it grows with every turn for the lifetime of the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user utterance.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::new(Speaker::User, text));
    }

    /// Appends a bot reply.
    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::new(Speaker::Bot, text));
    }

    /// Returns the number of recorded turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if nothing has been said yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the most recent turn.
    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Iterates over turns, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Renders the history as speaker-tagged lines, one per turn.
    #[must_use]
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.speaker.tag(), turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders the history followed by an utterance not yet recorded.
    #[must_use]
    pub fn render_with(&self, current: &str) -> String {
        let current = format!("{}: {current}", Speaker::User.tag());
        if self.turns.is_empty() {
            current
        } else {
            format!("{}\n{current}", self.render())
        }
    }
}
