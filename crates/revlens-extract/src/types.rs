//! Typed shape of the extraction payload.
//!
//! The external model returns an open JSON object; everything beyond the
//! contractual fields is preserved verbatim through `#[serde(flatten)]`
//! so the stored `aspects_json` keeps whatever the model supplied.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use revlens_core::Sentiment;

/// One aspect the model claims the review mentions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AspectMention {
    #[serde(default)]
    pub aspect: String,
    #[serde(default)]
    pub stakeholder: String,
    #[serde(default)]
    pub evidence: String,
    /// Assigned post-hoc from the evidence snippet; absent on raw extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_confidence: Option<f32>,
    /// Extraction-specific fields the model supplied (`confidence`, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl AspectMention {
    /// Model-reported extraction confidence, 0.0 when absent or non-numeric.
    pub fn extraction_confidence(&self) -> f64 {
        self.extra
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// A rejected or unparseable mention, preserved for audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnmappedIssue {
    pub issue: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub confidence: f64,
}

/// The full extraction payload, stored as `aspects_json` once processed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub mentioned_aspects: Vec<AspectMention>,
    #[serde(default)]
    pub unmapped_issues: Vec<UnmappedIssue>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_map_fields_survive_round_trip() {
        let json = r#"{
            "mentioned_aspects": [
                {"aspect": "delivery_time", "evidence": "late", "confidence": 0.9, "quote_lang": "en"}
            ],
            "unmapped_issues": [],
            "model_notes": "none"
        }"#;
        let parsed: ExtractionResult = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.mentioned_aspects.len(), 1);
        let mention = &parsed.mentioned_aspects[0];
        assert_eq!(mention.aspect, "delivery_time");
        assert!((mention.extraction_confidence() - 0.9).abs() < 1e-9);
        assert_eq!(mention.extra["quote_lang"], "en");
        assert_eq!(parsed.extra["model_notes"], "none");

        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["mentioned_aspects"][0]["quote_lang"], "en");
        assert_eq!(back["model_notes"], "none");
    }

    #[test]
    fn missing_fields_default() {
        let parsed: ExtractionResult = serde_json::from_str("{}").unwrap();
        assert!(parsed.mentioned_aspects.is_empty());
        assert!(parsed.unmapped_issues.is_empty());

        let mention: AspectMention =
            serde_json::from_str(r#"{"evidence": "x"}"#).unwrap();
        assert!(mention.aspect.is_empty());
        assert!(mention.stakeholder.is_empty());
        assert!(mention.sentiment.is_none());
        assert_eq!(mention.extraction_confidence(), 0.0);
    }
}
