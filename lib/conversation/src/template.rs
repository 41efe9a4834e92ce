//! Response templates with `{placeholder}` substitution.
//!
//! Placeholders naming a booking slot (`{date}`, `{time}`, `{number}`) are
//! required; rendering without a value for one of them fails. Any other
//! placeholder is optional and falls back to a default, or to nothing.

use crate::error::TemplateError;
use crate::slots::{SlotKind, SlotStore};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Defaults applied to optional placeholders when no value is given.
const OPTIONAL_DEFAULTS: &[(&str, &str)] = &[("name", "there")];

/// A response text containing named placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTemplate {
    text: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    defaults: HashMap<String, String>,
}

impl ResponseTemplate {
    /// Creates a template from its raw text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            defaults: HashMap::new(),
        }
    }

    /// Sets the default for an optional placeholder.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the placeholder names in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.text.as_str();
        while let Some((_, name, after)) = next_placeholder(rest) {
            names.push(name);
            rest = after;
        }
        names
    }

    /// Renders the template.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::MissingRequired` when a slot placeholder has
    /// no value.
    pub fn render(&self, values: &TemplateValues) -> Result<String, Report<TemplateError>> {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();

        while let Some((before, name, after)) = next_placeholder(rest) {
            out.push_str(before);
            out.push_str(&self.resolve(name, values)?);
            rest = after;
        }
        out.push_str(rest);

        Ok(out)
    }

    fn resolve(&self, name: &str, values: &TemplateValues) -> Result<String, TemplateError> {
        if let Some(value) = values.get(name) {
            return Ok(value.to_string());
        }
        if let Some(slot) = SlotKind::from_name(name) {
            return Err(TemplateError::MissingRequired { slot });
        }
        let default = self
            .defaults
            .get(name)
            .map(String::as_str)
            .or_else(|| {
                OPTIONAL_DEFAULTS
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
            })
            .unwrap_or_default();
        Ok(default.to_string())
    }
}

impl From<&str> for ResponseTemplate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for ResponseTemplate {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Splits `text` around its next well-formed `{name}` placeholder.
///
/// Braces that do not enclose an identifier are treated as literal text.
fn next_placeholder(text: &str) -> Option<(&str, &str, &str)> {
    let mut offset = 0;
    while let Some(open) = text[offset..].find('{').map(|i| i + offset) {
        let close = text[open + 1..].find('}').map(|i| i + open + 1)?;
        let name = &text[open + 1..close];
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Some((&text[..open], name, &text[close + 1..]));
        }
        offset = open + 1;
    }
    None
}

/// Named values available to a render.
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    values: HashMap<String, String>,
}

impl TemplateValues {
    /// Creates an empty value set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a value set holding every filled slot.
    #[must_use]
    pub fn from_slots(slots: &SlotStore) -> Self {
        let mut values = Self::new();
        for (kind, value) in slots.iter() {
            values.insert(kind.as_str(), value);
        }
        values
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a value. Blank values are ignored so defaults still apply.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.values.insert(name.into(), value);
        }
    }

    /// Returns the value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}
