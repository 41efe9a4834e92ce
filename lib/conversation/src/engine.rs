//! The dialogue engine: one instance per chat session.
//!
//! Each turn is classified, dispatched on the current [`SessionState`], and
//! answered from the script, the slot-filling flow, or the fallback
//! responder. Collaborator failures degrade instead of surfacing:
//! - a classifier failure becomes the `fallback` intent
//! - an extractor failure becomes an empty value, which re-prompts
//! - a fallback responder failure becomes the scripted apology
//!
//! The engine is not synchronized; callers serialize turns per session.

use crate::capability::Capabilities;
use crate::history::ConversationHistory;
use crate::intent::Intent;
use crate::node::Lookup;
use crate::script::Script;
use crate::session::{SessionState, UserProfile};
use crate::slots::{AfterBooking, BookingPolicy, SlotKind, SlotStore};
use crate::template::TemplateValues;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Last-resort reply when even the scripted apology cannot be rendered.
const APOLOGY: &str = "I'm sorry, something went wrong. Could you say that again?";

/// A conversation in progress.
#[derive(Debug)]
pub struct DialogueEngine {
    script: Arc<Script>,
    capabilities: Capabilities,
    policy: BookingPolicy,
    profile: UserProfile,
    state: SessionState,
    slots: SlotStore,
    history: ConversationHistory,
}

impl DialogueEngine {
    /// Creates an idle engine with empty slots and history.
    #[must_use]
    pub fn new(script: Arc<Script>, capabilities: Capabilities) -> Self {
        Self {
            script,
            capabilities,
            policy: BookingPolicy::default(),
            profile: UserProfile::default(),
            state: SessionState::Idle,
            slots: SlotStore::new(),
            history: ConversationHistory::new(),
        }
    }

    /// Sets the booking policy.
    #[must_use]
    pub fn with_policy(mut self, policy: BookingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the user profile.
    #[must_use]
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Updates the display name used by greeting templates.
    pub fn set_user_name(&mut self, name: impl Into<String>) {
        self.profile.name = Some(name.into());
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the slots collected so far.
    #[must_use]
    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    /// Returns the conversation so far.
    #[must_use]
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Handles one user utterance and returns the reply.
    ///
    /// Always produces a reply. Both the utterance and the reply are
    /// appended to the history before returning.
    #[instrument(skip_all, fields(state = %self.state))]
    pub async fn handle_turn(&mut self, utterance: &str) -> String {
        let reply = match self.state {
            SessionState::Idle => self.idle_turn(utterance).await,
            SessionState::AwaitingSlot(kind) => self.awaiting_turn(kind, utterance).await,
        };

        self.history.push_user(utterance);
        self.history.push_bot(reply.clone());

        debug!(next_state = %self.state, "turn handled");
        reply
    }

    async fn idle_turn(&mut self, utterance: &str) -> String {
        let intent = self.classify(utterance).await;

        match intent {
            Intent::BookRestaurant => {
                self.extract_into(utterance, &SlotKind::ORDER).await;
                self.advance_booking()
            }
            Intent::Yes => self.advance_booking(),
            Intent::Cancel => self.cancel(),
            Intent::Greeting | Intent::IAmFine => {
                self.scripted_with(intent, self.script.greeting_follow_up())
            }
            Intent::RestaurantOpeningHours | Intent::JobOpportunities | Intent::Help => {
                self.informational(intent)
            }
            Intent::Goodbye => self.scripted(intent),
            Intent::No | Intent::IDontKnow | Intent::Fallback => {
                self.unmatched(intent, utterance).await
            }
        }
    }

    async fn awaiting_turn(&mut self, pending: SlotKind, utterance: &str) -> String {
        let intent = self.classify(utterance).await;
        if intent == Intent::Cancel {
            return self.cancel();
        }

        let value = self.extract(utterance, pending).await;
        if self.slots.fill(pending, &value) {
            self.state = SessionState::Idle;
            if self.policy.fill_remaining_from_answer {
                let remaining: Vec<SlotKind> = self.slots.missing().collect();
                self.extract_into(utterance, &remaining).await;
            }
            return self.advance_booking();
        }

        if intent.is_informational() {
            return self.informational(intent);
        }

        debug!(slot = %pending, "no value extracted, asking again");
        pending.prompt().to_string()
    }

    /// Asks for the first missing slot, or confirms once all are present.
    fn advance_booking(&mut self) -> String {
        match self.slots.first_missing() {
            Some(kind) => {
                self.state = SessionState::AwaitingSlot(kind);
                kind.prompt().to_string()
            }
            None => {
                self.state = SessionState::Idle;
                self.confirm_booking()
            }
        }
    }

    fn confirm_booking(&mut self) -> String {
        let Lookup::Found(template) = self.script.lookup(Intent::BookRestaurant) else {
            warn!("booking confirmation is not scripted");
            return self.apology();
        };

        match template.render(&self.template_values()) {
            Ok(reply) => {
                info!(
                    date = self.slots.get(SlotKind::Date).unwrap_or_default(),
                    time = self.slots.get(SlotKind::Time).unwrap_or_default(),
                    number = self.slots.get(SlotKind::Number).unwrap_or_default(),
                    "booking confirmed"
                );
                if self.policy.after_booking == AfterBooking::Reset {
                    self.slots.clear();
                }
                reply
            }
            Err(report) => {
                warn!(error = %report, "booking confirmation could not be rendered");
                self.apology()
            }
        }
    }

    fn cancel(&mut self) -> String {
        self.slots.clear();
        self.state = SessionState::Idle;
        self.scripted(Intent::Cancel)
    }

    fn informational(&self, intent: Intent) -> String {
        self.scripted_with(intent, self.script.booking_invitation())
    }

    async fn unmatched(&self, intent: Intent, utterance: &str) -> String {
        if let Some(reply) = self.render(intent) {
            return reply;
        }

        debug!(%intent, "no scripted response, asking the fallback responder");
        let context = self.history.render_with(utterance);
        match self.capabilities.fallback.reply(&context).await {
            Ok(reply) => reply,
            Err(report) => {
                warn!(error = %report, "fallback responder failed");
                self.apology()
            }
        }
    }

    fn scripted(&self, intent: Intent) -> String {
        self.render(intent).unwrap_or_else(|| self.apology())
    }

    fn scripted_with(&self, intent: Intent, follow_up: &str) -> String {
        match self.render(intent) {
            Some(text) => format!("{text} {follow_up}"),
            None => self.apology(),
        }
    }

    fn apology(&self) -> String {
        self.render(Intent::Fallback)
            .unwrap_or_else(|| APOLOGY.to_string())
    }

    fn render(&self, intent: Intent) -> Option<String> {
        let template = self.script.lookup(intent).found()?;
        match template.render(&self.template_values()) {
            Ok(text) => Some(text),
            Err(report) => {
                warn!(%intent, error = %report, "response could not be rendered");
                None
            }
        }
    }

    fn template_values(&self) -> TemplateValues {
        let mut values = TemplateValues::from_slots(&self.slots);
        if let Some(name) = &self.profile.name {
            values.insert("name", name.as_str());
        }
        values
    }

    async fn classify(&self, utterance: &str) -> Intent {
        match self.capabilities.classifier.classify(utterance).await {
            Ok(label) => {
                let intent = Intent::from_label_or_fallback(&label);
                debug!(label = %label.trim(), %intent, "classified utterance");
                intent
            }
            Err(report) => {
                warn!(error = %report, "intent classification failed");
                Intent::Fallback
            }
        }
    }

    async fn extract(&self, utterance: &str, kind: SlotKind) -> String {
        match self.capabilities.extractor.extract(utterance, kind).await {
            Ok(value) => value.trim().to_string(),
            Err(report) => {
                warn!(slot = %kind, error = %report, "slot extraction failed");
                String::new()
            }
        }
    }

    async fn extract_into(&mut self, utterance: &str, kinds: &[SlotKind]) {
        for kind in kinds {
            let value = self.extract(utterance, *kind).await;
            if self.slots.fill(*kind, &value) {
                debug!(slot = %kind, value = %value, "slot filled");
            }
        }
    }
}
