//! Validated dialogue scripts.
//!
//! A [`Script`] pairs a [`NodeRegistry`] with the routing table that says
//! which node answers each intent. Construction checks the wiring, so a
//! lookup by node name can never hit a node that does not exist.

use crate::error::DialogueError;
use crate::intent::Intent;
use crate::node::{Lookup, NodeRegistry, ResponseNode};
use std::collections::HashMap;
use tablebot_core::Result;

/// Intents the engine renders directly; each needs a routed template.
const ESSENTIAL: [Intent; 9] = [
    Intent::Greeting,
    Intent::IAmFine,
    Intent::BookRestaurant,
    Intent::RestaurantOpeningHours,
    Intent::JobOpportunities,
    Intent::Help,
    Intent::Cancel,
    Intent::Goodbye,
    Intent::Fallback,
];

#[derive(Debug, Clone)]
struct Route {
    node: String,
    required: bool,
}

/// Intent → node routing table.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    routes: HashMap<Intent, Route>,
}

impl Routes {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `intent` to `node`; the node must script a response for it.
    #[must_use]
    pub fn route(mut self, intent: Intent, node: impl Into<String>) -> Self {
        self.routes.insert(
            intent,
            Route {
                node: node.into(),
                required: true,
            },
        );
        self
    }

    /// Routes `intent` to `node`, allowing the node to leave it unscripted.
    ///
    /// Unscripted intents are answered by the fallback responder.
    #[must_use]
    pub fn route_optional(mut self, intent: Intent, node: impl Into<String>) -> Self {
        self.routes.insert(
            intent,
            Route {
                node: node.into(),
                required: false,
            },
        );
        self
    }

    /// Returns the node answering `intent`.
    #[must_use]
    pub fn node_for(&self, intent: Intent) -> Option<&str> {
        self.routes.get(&intent).map(|route| route.node.as_str())
    }
}

/// A validated registry plus routing table and the fixed follow-up lines.
#[derive(Debug, Clone)]
pub struct Script {
    registry: NodeRegistry,
    routes: Routes,
    booking_invitation: String,
    greeting_follow_up: String,
}

impl Script {
    /// Validates the wiring and builds a script.
    ///
    /// # Errors
    ///
    /// Fails when an essential intent is unrouted, when a route names an
    /// unregistered node, or when a required route has no template.
    pub fn new(registry: NodeRegistry, routes: Routes) -> Result<Self, DialogueError> {
        for intent in ESSENTIAL {
            if routes.node_for(intent).is_none() {
                return Err(DialogueError::Unrouted { intent }.into());
            }
        }

        for (intent, route) in &routes.routes {
            if !registry.contains(&route.node) {
                return Err(DialogueError::MissingNode {
                    intent: *intent,
                    node: route.node.clone(),
                }
                .into());
            }
            if route.required && !registry.get_response(&route.node, *intent).is_found() {
                return Err(DialogueError::MissingResponse {
                    node: route.node.clone(),
                    intent: *intent,
                }
                .into());
            }
        }

        Ok(Self {
            registry,
            routes,
            booking_invitation: "Would you like to book a table with us?".to_string(),
            greeting_follow_up: "Would you like to book a table?".to_string(),
        })
    }

    /// The restaurant script the server runs with.
    ///
    /// # Errors
    ///
    /// Never fails in practice; validation runs like for any other script.
    pub fn restaurant() -> Result<Self, DialogueError> {
        let registry = NodeRegistry::new()
            .with_node(
                ResponseNode::new("greeting")
                    .with_intent(Intent::Greeting, "Hello {name}! How are you today?")
                    .with_intent(Intent::IAmFine, "Glad to hear that!"),
            )
            .with_node(
                ResponseNode::new("information")
                    .with_intent(
                        Intent::RestaurantOpeningHours,
                        "We are open every day from 11am to 10pm.",
                    )
                    .with_intent(
                        Intent::JobOpportunities,
                        "We are always looking for friendly people. Drop your CV at the front desk any afternoon.",
                    )
                    .with_intent(
                        Intent::Help,
                        "I can tell you our opening hours, tell you about working with us, or book a table for you.",
                    ),
            )
            .with_node(ResponseNode::new("booking").with_intent(
                Intent::BookRestaurant,
                "Great! Your table for {number} is booked on {date} at {time}.",
            ))
            .with_node(
                ResponseNode::new("cancel")
                    .with_intent(Intent::Cancel, "Okay, I have cancelled your booking."),
            )
            .with_node(
                ResponseNode::new("farewell")
                    .with_intent(Intent::Goodbye, "Goodbye! Have a great day."),
            )
            .with_node(
                ResponseNode::new("fallback")
                    .with_intent(
                        Intent::Fallback,
                        "I'm sorry, I didn't understand that. Could you rephrase?",
                    )
                    .with_intent(
                        Intent::No,
                        "No problem. Is there anything else I can help you with?",
                    ),
            );

        let routes = Routes::new()
            .route(Intent::Greeting, "greeting")
            .route(Intent::IAmFine, "greeting")
            .route(Intent::RestaurantOpeningHours, "information")
            .route(Intent::JobOpportunities, "information")
            .route(Intent::Help, "information")
            .route(Intent::BookRestaurant, "booking")
            .route(Intent::Cancel, "cancel")
            .route(Intent::Goodbye, "farewell")
            .route(Intent::Fallback, "fallback")
            .route_optional(Intent::No, "fallback")
            .route_optional(Intent::IDontKnow, "fallback");

        Self::new(registry, routes)
    }

    /// Replaces the sentence appended to informational answers.
    #[must_use]
    pub fn with_booking_invitation(mut self, text: impl Into<String>) -> Self {
        self.booking_invitation = text.into();
        self
    }

    /// Replaces the sentence appended to greetings.
    #[must_use]
    pub fn with_greeting_follow_up(mut self, text: impl Into<String>) -> Self {
        self.greeting_follow_up = text.into();
        self
    }

    /// Looks up the scripted response for `intent` on its routed node.
    #[must_use]
    pub fn lookup(&self, intent: Intent) -> Lookup<'_> {
        self.routes
            .node_for(intent)
            .map_or(Lookup::NotFound, |node| self.registry.get_response(node, intent))
    }

    /// The sentence appended to informational answers.
    #[must_use]
    pub fn booking_invitation(&self) -> &str {
        &self.booking_invitation
    }

    /// The sentence appended to greetings.
    #[must_use]
    pub fn greeting_follow_up(&self) -> &str {
        &self.greeting_follow_up
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restaurant_script_is_valid() {
        let script = Script::restaurant().expect("valid script");

        assert!(script.lookup(Intent::BookRestaurant).is_found());
        assert!(script.lookup(Intent::No).is_found());
        assert_eq!(script.lookup(Intent::IDontKnow), Lookup::NotFound);
        assert_eq!(script.lookup(Intent::Yes), Lookup::NotFound);
    }

    #[test]
    fn missing_node_is_rejected() {
        let registry = Script::restaurant().expect("valid script").registry().clone();
        let routes = Routes::new()
            .route(Intent::Greeting, "greeting")
            .route(Intent::IAmFine, "greeting")
            .route(Intent::RestaurantOpeningHours, "information")
            .route(Intent::JobOpportunities, "information")
            .route(Intent::Help, "information")
            .route(Intent::BookRestaurant, "reservations")
            .route(Intent::Cancel, "cancel")
            .route(Intent::Goodbye, "farewell")
            .route(Intent::Fallback, "fallback");

        assert!(Script::new(registry, routes).is_err());
    }

    #[test]
    fn unrouted_essential_intent_is_rejected() {
        let registry = NodeRegistry::new()
            .with_node(ResponseNode::new("fallback").with_intent("fallback", "Sorry?"));
        let routes = Routes::new().route(Intent::Fallback, "fallback");

        assert!(Script::new(registry, routes).is_err());
    }

    #[test]
    fn required_route_without_template_is_rejected() {
        let mut registry = Script::restaurant().expect("valid script").registry().clone();
        registry.register(ResponseNode::new("farewell"));
        let routes = Routes::new()
            .route(Intent::Greeting, "greeting")
            .route(Intent::IAmFine, "greeting")
            .route(Intent::RestaurantOpeningHours, "information")
            .route(Intent::JobOpportunities, "information")
            .route(Intent::Help, "information")
            .route(Intent::BookRestaurant, "booking")
            .route(Intent::Cancel, "cancel")
            .route(Intent::Goodbye, "farewell")
            .route(Intent::Fallback, "fallback");

        assert!(Script::new(registry, routes).is_err());
    }

    #[test]
    fn follow_ups_can_be_replaced() {
        let script = Script::restaurant()
            .expect("valid script")
            .with_booking_invitation("Shall I reserve a table?");
        assert_eq!(script.booking_invitation(), "Shall I reserve a table?");
        assert_eq!(script.greeting_follow_up(), "Would you like to book a table?");
    }
}
