//! Response nodes and the registry that owns them.
//!
//! A node is a named bundle of intent → template mappings. Intent keys are
//! stored lowercased so lookups are case-insensitive, and labels outside the
//! [`Intent`] set can still be scripted.

use crate::intent::Intent;
use crate::template::ResponseTemplate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of looking up a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The node has a template for the intent.
    Found(&'a ResponseTemplate),
    /// No template; callers decide what to do instead.
    NotFound,
}

impl<'a> Lookup<'a> {
    /// Converts into an `Option`.
    #[must_use]
    pub fn found(self) -> Option<&'a ResponseTemplate> {
        match self {
            Self::Found(template) => Some(template),
            Self::NotFound => None,
        }
    }

    /// Returns true for `Found`.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl<'a> From<Option<&'a ResponseTemplate>> for Lookup<'a> {
    fn from(value: Option<&'a ResponseTemplate>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}

/// A named bundle of intent → response template mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseNode {
    name: String,
    responses: HashMap<String, ResponseTemplate>,
}

impl ResponseNode {
    /// Creates an empty node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: HashMap::new(),
        }
    }

    /// Adds a response, builder style.
    #[must_use]
    pub fn with_intent(
        mut self,
        intent: impl AsRef<str>,
        template: impl Into<ResponseTemplate>,
    ) -> Self {
        self.add_intent(intent, template);
        self
    }

    /// Stores the template for `intent`, replacing any previous one.
    pub fn add_intent(&mut self, intent: impl AsRef<str>, template: impl Into<ResponseTemplate>) {
        self.responses
            .insert(normalize_key(intent.as_ref()), template.into());
    }

    /// Returns the node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the template for a raw intent label.
    #[must_use]
    pub fn get_response(&self, intent: &str) -> Lookup<'_> {
        self.responses.get(&normalize_key(intent)).into()
    }

    /// Looks up the template for an intent.
    #[must_use]
    pub fn response_for(&self, intent: Intent) -> Lookup<'_> {
        self.responses.get(intent.as_str()).into()
    }

    /// Returns the number of scripted intents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns true if no intent is scripted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

fn normalize_key(intent: &str) -> String {
    intent.trim().to_lowercase()
}

/// Named collection of response nodes.
///
/// Populated once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, ResponseNode>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node, replacing one with the same name.
    pub fn register(&mut self, node: ResponseNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    /// Registers a node, builder style.
    #[must_use]
    pub fn with_node(mut self, node: ResponseNode) -> Self {
        self.register(node);
        self
    }

    /// Stores `template` for `intent` on the named node, creating the node
    /// if needed.
    pub fn add_intent(
        &mut self,
        node: &str,
        intent: impl AsRef<str>,
        template: impl Into<ResponseTemplate>,
    ) {
        self.nodes
            .entry(node.to_string())
            .or_insert_with(|| ResponseNode::new(node))
            .add_intent(intent, template);
    }

    /// Gets a node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResponseNode> {
        self.nodes.get(name)
    }

    /// Looks up a response on a node. A missing node is also `NotFound`.
    #[must_use]
    pub fn get_response(&self, node: &str, intent: Intent) -> Lookup<'_> {
        self.nodes
            .get(node)
            .map_or(Lookup::NotFound, |n| n.response_for(intent))
    }

    /// Returns true if a node with `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Returns the number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_keys_are_case_insensitive() {
        let node = ResponseNode::new("greeting").with_intent("Greeting", "Hello!");

        assert!(node.get_response("GREETING").is_found());
        assert!(node.response_for(Intent::Greeting).is_found());
    }

    #[test]
    fn add_intent_overwrites() {
        let mut node = ResponseNode::new("farewell");
        node.add_intent("goodbye", "Bye.");
        node.add_intent("goodbye", "Farewell!");

        assert_eq!(node.len(), 1);
        let template = node.response_for(Intent::Goodbye).found().expect("scripted");
        assert_eq!(template.text(), "Farewell!");
    }

    #[test]
    fn absence_is_not_found() {
        let registry = NodeRegistry::new().with_node(ResponseNode::new("greeting"));

        assert_eq!(registry.get_response("greeting", Intent::No), Lookup::NotFound);
        assert_eq!(registry.get_response("nowhere", Intent::No), Lookup::NotFound);
    }

    #[test]
    fn registry_add_intent_creates_node() {
        let mut registry = NodeRegistry::new();
        assert!(registry.is_empty());

        registry.add_intent("information", "help", "I can book tables.");

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("information"));
        assert!(registry.get_response("information", Intent::Help).is_found());
    }

    #[test]
    fn forward_compatible_labels_can_be_scripted() {
        let node = ResponseNode::new("misc").with_intent("order_status", "Checking...");
        assert!(node.get_response("order_status").is_found());
    }
}
