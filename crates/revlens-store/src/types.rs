//! Row types for raw reviews and enriched records.

use serde::{Deserialize, Serialize};

use revlens_core::Sentiment;

/// A raw review row, immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReview {
    pub id: i64,
    pub source: String,
    pub source_review_id: String,
    pub vertical: String,
    /// Review authoring time, epoch millis UTC.
    pub created_at: i64,
    /// Capture time, epoch millis UTC.
    pub ingested_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub original_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<serde_json::Value>,
}

/// A raw review about to be inserted.
#[derive(Debug, Clone, Default)]
pub struct NewRawReview {
    pub source: String,
    pub source_review_id: String,
    pub vertical: String,
    pub created_at: i64,
    pub ingested_at: i64,
    pub rating: Option<i64>,
    pub language: Option<String>,
    pub original_text: String,
    pub raw_payload: Option<serde_json::Value>,
}

/// The enrichment output for one raw review, ready to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub raw_id: i64,
    pub source: String,
    pub source_review_id: String,
    pub vertical: String,
    pub created_at: i64,
    pub analyzed_at: i64,
    pub overall_sentiment: Sentiment,
    /// The processed extraction payload (`mentioned_aspects`, `unmapped_issues`).
    pub aspects: serde_json::Value,
    /// Stakeholder → sentiment → count.
    pub stakeholder_flags: serde_json::Value,
    pub model_version: String,
    pub prompt_version: String,
}

/// An enriched row read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedReview {
    pub id: i64,
    pub raw_id: i64,
    pub source: String,
    pub source_review_id: String,
    pub vertical: String,
    pub created_at: i64,
    pub analyzed_at: i64,
    pub overall_sentiment: Sentiment,
    pub aspects: serde_json::Value,
    pub stakeholder_flags: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<String>,
}
