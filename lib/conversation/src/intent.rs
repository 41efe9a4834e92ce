//! Intent labels understood by the dialogue engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coarse category describing the purpose of a user utterance.
///
/// The set is closed: classifier output outside of it parses to
/// [`Intent::Fallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    IAmFine,
    BookRestaurant,
    RestaurantOpeningHours,
    JobOpportunities,
    Cancel,
    Help,
    IDontKnow,
    Yes,
    Goodbye,
    No,
    Fallback,
}

impl Intent {
    /// Every intent, in the order they are offered to the classifier.
    pub const ALL: [Intent; 12] = [
        Intent::Greeting,
        Intent::IAmFine,
        Intent::BookRestaurant,
        Intent::RestaurantOpeningHours,
        Intent::JobOpportunities,
        Intent::Cancel,
        Intent::Help,
        Intent::IDontKnow,
        Intent::Yes,
        Intent::Goodbye,
        Intent::No,
        Intent::Fallback,
    ];

    /// Returns the wire label of the intent.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::IAmFine => "i_am_fine",
            Self::BookRestaurant => "book_restaurant",
            Self::RestaurantOpeningHours => "restaurant_opening_hours",
            Self::JobOpportunities => "job_opportunities",
            Self::Cancel => "cancel",
            Self::Help => "help",
            Self::IDontKnow => "i_dont_know",
            Self::Yes => "yes",
            Self::Goodbye => "goodbye",
            Self::No => "no",
            Self::Fallback => "fallback",
        }
    }

    /// Parses a classifier label, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for labels outside the enumerated set.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str().eq_ignore_ascii_case(label))
    }

    /// Parses a classifier label, routing anything unknown to `Fallback`.
    #[must_use]
    pub fn from_label_or_fallback(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Self::Fallback)
    }

    /// Returns true for intents answered with a fixed informational text
    /// followed by a booking invitation.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::RestaurantOpeningHours | Self::JobOpportunities | Self::Help
        )
    }
}

impl AsRef<str> for Intent {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Intent::from_label("Book_Restaurant"), Some(Intent::BookRestaurant));
        assert_eq!(Intent::from_label("  yes\n"), Some(Intent::Yes));
    }

    #[test]
    fn unknown_label_routes_to_fallback() {
        assert_eq!(Intent::from_label("banana"), None);
        assert_eq!(Intent::from_label_or_fallback("banana"), Intent::Fallback);
        assert_eq!(Intent::from_label_or_fallback(""), Intent::Fallback);
    }

    #[test]
    fn every_label_round_trips() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_label(intent.as_str()), Some(intent));
        }
    }

    #[test]
    fn serde_uses_wire_labels() {
        let json = serde_json::to_string(&Intent::RestaurantOpeningHours).expect("serialize");
        assert_eq!(json, "\"restaurant_opening_hours\"");
    }
}
