//! Prompt templates.
//!
//! Templates substitute `{{variable}}` placeholders. The prompts the dialogue
//! capabilities send are built here so their wording lives in one place.

use crate::error::PromptError;
use rootcause::Report;
use std::collections::HashMap;
use tablebot_conversation::{Intent, SlotKind};

/// Definition of a template variable.
#[derive(Debug, Clone)]
pub struct VariableDefinition {
    /// Description of what this variable is for.
    pub description: String,
    /// Whether this variable is required.
    pub required: bool,
    /// Default value if not provided.
    pub default: Option<String>,
}

impl VariableDefinition {
    /// Creates a required variable definition.
    #[must_use]
    pub fn required(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// Creates an optional variable definition.
    #[must_use]
    pub fn optional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: false,
            default: None,
        }
    }

    /// Sets a default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A named prompt with an optional system prompt.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Template name, used in errors.
    pub name: String,
    /// Template content with placeholders.
    pub content: String,
    /// Optional system prompt template.
    pub system_prompt: Option<String>,
    /// Variable definitions (name -> definition).
    pub variables: HashMap<String, VariableDefinition>,
}

impl PromptTemplate {
    /// Creates a new prompt template.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            system_prompt: None,
            variables: HashMap::new(),
        }
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Adds a variable definition.
    #[must_use]
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        definition: VariableDefinition,
    ) -> Self {
        self.variables.insert(name.into(), definition);
        self
    }

    /// Renders the content with the given variables.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::MissingVariable` when a required variable without
    /// a default is not provided.
    pub fn render(
        &self,
        variables: &HashMap<&str, String>,
    ) -> Result<String, Report<PromptError>> {
        self.validate_variables(variables)?;
        Ok(self.substitute(&self.content, variables))
    }

    /// Renders the system prompt with the given variables.
    #[must_use]
    pub fn render_system_prompt(&self, variables: &HashMap<&str, String>) -> Option<String> {
        self.system_prompt
            .as_ref()
            .map(|template| self.substitute(template, variables))
    }

    /// Fills placeholders in one left-to-right pass; substituted text is
    /// never rescanned. Unknown placeholders are left as written.
    fn substitute(&self, template: &str, variables: &HashMap<&str, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            match self.value_for(&after[..end], variables) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..start + end + 4]),
            }
            rest = &after[end + 2..];
        }

        result.push_str(rest);
        result
    }

    fn value_for<'a>(
        &'a self,
        name: &str,
        variables: &'a HashMap<&str, String>,
    ) -> Option<&'a str> {
        variables
            .get(name)
            .map(String::as_str)
            .or_else(|| self.variables.get(name)?.default.as_deref())
    }

    fn validate_variables(
        &self,
        variables: &HashMap<&str, String>,
    ) -> Result<(), Report<PromptError>> {
        let missing = self
            .variables
            .iter()
            .filter(|(_, def)| def.required && def.default.is_none())
            .find(|(name, _)| !variables.contains_key(name.as_str()));

        match missing {
            Some((name, def)) => Err(PromptError::MissingVariable {
                template: self.name.clone(),
                variable: name.clone(),
                description: def.description.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Prompt asking for a single intent label.
#[must_use]
pub fn classify_intent() -> PromptTemplate {
    let labels = Intent::ALL
        .iter()
        .map(|intent| format!("- {}", intent.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    PromptTemplate::new("classify_intent", "{{utterance}}")
        .with_system_prompt(format!(
            "You are an intent classifier for a restaurant assistant. \
             Given a user message, classify it into exactly one of the following intents:\n\
             {labels}\n\n\
             Use fallback if the message matches none of them. \
             Respond only with the intent name."
        ))
        .with_variable("utterance", VariableDefinition::required("The user's message"))
}

/// Prompt asking for the value of one booking slot.
#[must_use]
pub fn extract_slot() -> PromptTemplate {
    PromptTemplate::new("extract_slot", "{{utterance}}")
        .with_system_prompt(
            "You extract booking details from a customer's message to a restaurant. \
             Reply with the {{slot}} the customer mentions, {{format}}. \
             Reply with only the value, no explanation. \
             If the message does not mention a {{slot}}, reply with an empty message.",
        )
        .with_variable("utterance", VariableDefinition::required("The user's message"))
        .with_variable("slot", VariableDefinition::required("The slot to extract"))
        .with_variable(
            "format",
            VariableDefinition::optional("How the value should be written")
                .with_default("exactly as the customer wrote it"),
        )
}

/// How the extractor should phrase each slot's value.
#[must_use]
pub fn slot_format(kind: SlotKind) -> &'static str {
    match kind {
        SlotKind::Date => "as the customer wrote it (for example \"tomorrow\" or \"May 3\")",
        SlotKind::Time => "as the customer wrote it (for example \"7pm\")",
        SlotKind::Number => "as digits (for example \"4\")",
    }
}

/// Prompt continuing a conversation the script has no answer for.
#[must_use]
pub fn fallback_reply() -> PromptTemplate {
    PromptTemplate::new("fallback_reply", "{{conversation}}")
        .with_system_prompt(
            "You are the friendly assistant of a restaurant. \
             The conversation so far is given as lines prefixed with User: or Bot:. \
             Reply to the last User line in one or two short sentences.",
        )
        .with_variable(
            "conversation",
            VariableDefinition::required("Speaker-tagged conversation"),
        )
}
