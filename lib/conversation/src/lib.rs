//! Dialogue engine for tablebot.
//!
//! This crate provides:
//!
//! - **Script**: response nodes, intent routing and response templates
//! - **Slot filling**: the booking slots and the policy around them
//! - **Engine**: the per-session state machine answering each turn
//! - **Capabilities**: the classifier, extractor and fallback seams the
//!   engine delegates to

pub mod capability;
pub mod engine;
pub mod error;
pub mod history;
pub mod intent;
pub mod node;
pub mod script;
pub mod session;
pub mod slots;
pub mod template;

pub use capability::{Capabilities, FallbackResponder, IntentClassifier, SlotExtractor};
pub use engine::DialogueEngine;
pub use error::{CapabilityError, DialogueError, TemplateError};
pub use history::{ConversationHistory, Speaker, Turn};
pub use intent::Intent;
pub use node::{Lookup, NodeRegistry, ResponseNode};
pub use script::{Routes, Script};
pub use session::{SessionState, UserProfile};
pub use slots::{AfterBooking, BookingPolicy, SlotKind, SlotStore};
pub use template::{ResponseTemplate, TemplateValues};
