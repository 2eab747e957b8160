//! The three-way sentiment label shared by the classifier, the
//! guardrail tally, and the enriched-record schema.

use serde::{Deserialize, Serialize};

/// Overall or per-aspect sentiment.
///
/// Serializes to the capitalized strings downstream consumers index by
/// (`"Positive"` / `"Neutral"` / `"Negative"`). Deserializing any
/// unrecognized label coerces to `Neutral`, which is also the tally
/// coercion rule for unknown sentiment values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    #[serde(other)]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }

    /// Parse a label string, coercing anything unrecognized to Neutral.
    pub fn parse_or_neutral(label: &str) -> Self {
        match label {
            "Positive" => Self::Positive,
            "Negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
