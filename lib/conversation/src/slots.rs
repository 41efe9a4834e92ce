//! Booking slots and the store that collects them across turns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A piece of structured information required to book a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Date,
    Time,
    Number,
}

impl SlotKind {
    /// Fixed scan order used when looking for the next slot to ask about.
    pub const ORDER: [SlotKind; 3] = [SlotKind::Date, SlotKind::Time, SlotKind::Number];

    /// Returns the placeholder/slot name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Number => "number",
        }
    }

    /// Returns the slot whose name matches `name` exactly.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|kind| kind.as_str() == name)
    }

    /// The question asked while this slot is pending.
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::Date => "When do you want to go?",
            Self::Time => "What time do you want to go?",
            Self::Number => "How many people will be going?",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values extracted so far for the in-progress booking.
///
/// Only non-empty values are ever stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStore {
    values: BTreeMap<SlotKind, String>,
}

impl SlotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `kind` after trimming it.
    ///
    /// Returns false, leaving the store untouched, when the value is blank.
    pub fn fill(&mut self, kind: SlotKind, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.values.insert(kind, value.to_string());
        true
    }

    /// Returns the value held for `kind`.
    #[must_use]
    pub fn get(&self, kind: SlotKind) -> Option<&str> {
        self.values.get(&kind).map(String::as_str)
    }

    /// Returns true when `kind` holds a value.
    #[must_use]
    pub fn is_filled(&self, kind: SlotKind) -> bool {
        self.values.contains_key(&kind)
    }

    /// Returns the first slot, in date → time → number order, with no value.
    #[must_use]
    pub fn first_missing(&self) -> Option<SlotKind> {
        SlotKind::ORDER
            .into_iter()
            .find(|kind| !self.is_filled(*kind))
    }

    /// Returns the slots still lacking a value, in scan order.
    pub fn missing(&self) -> impl Iterator<Item = SlotKind> + '_ {
        SlotKind::ORDER
            .into_iter()
            .filter(|kind| !self.is_filled(*kind))
    }

    /// Returns true once every slot holds a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    /// Returns true if no slot holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Iterates over filled slots in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKind, &str)> {
        self.values.iter().map(|(kind, value)| (*kind, value.as_str()))
    }
}

/// What happens to collected slots once a booking has been confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterBooking {
    /// Keep the values: a later booking request re-confirms them without
    /// asking again.
    #[default]
    CarryOver,
    /// Clear the values so the next booking starts from scratch.
    Reset,
}

/// Tunables for the booking flow.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingPolicy {
    /// Slot handling after a confirmed booking.
    #[serde(default)]
    pub after_booking: AfterBooking,

    /// When an awaited slot is answered, also try to pull the other
    /// missing slots out of the same answer ("tomorrow at 7pm").
    #[serde(default = "default_fill_remaining_from_answer")]
    pub fill_remaining_from_answer: bool,
}

fn default_fill_remaining_from_answer() -> bool {
    true
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            after_booking: AfterBooking::default(),
            fill_remaining_from_answer: default_fill_remaining_from_answer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_not_stored() {
        let mut store = SlotStore::new();
        assert!(!store.fill(SlotKind::Date, "   "));
        assert!(store.is_empty());

        assert!(store.fill(SlotKind::Date, " Friday "));
        assert_eq!(store.get(SlotKind::Date), Some("Friday"));
    }

    #[test]
    fn scan_order_is_date_time_number() {
        let mut store = SlotStore::new();
        assert_eq!(store.first_missing(), Some(SlotKind::Date));

        store.fill(SlotKind::Number, "4");
        assert_eq!(store.first_missing(), Some(SlotKind::Date));

        store.fill(SlotKind::Date, "Friday");
        assert_eq!(store.first_missing(), Some(SlotKind::Time));
        assert_eq!(store.missing().collect::<Vec<_>>(), vec![SlotKind::Time]);

        store.fill(SlotKind::Time, "7pm");
        assert!(store.is_complete());
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = SlotStore::new();
        store.fill(SlotKind::Time, "8pm");
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.first_missing(), Some(SlotKind::Date));
    }

    #[test]
    fn slot_names_match_placeholders() {
        assert_eq!(SlotKind::from_name("number"), Some(SlotKind::Number));
        assert_eq!(SlotKind::from_name("Number"), None);
    }

    #[test]
    fn booking_policy_defaults() {
        let policy = BookingPolicy::default();
        assert_eq!(policy.after_booking, AfterBooking::CarryOver);
        assert!(policy.fill_remaining_from_answer);

        let parsed: BookingPolicy =
            serde_json::from_str(r#"{"after_booking":"reset"}"#).expect("deserialize");
        assert_eq!(parsed.after_booking, AfterBooking::Reset);
        assert!(parsed.fill_remaining_from_answer);
    }
}
