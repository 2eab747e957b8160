//! Normalization of source payloads into raw review rows.

use chrono::{DateTime, Utc};
use serde_json::Value;

use revlens_core::now_millis;
use revlens_store::NewRawReview;

/// Normalize a Google-Play-shaped payload (`reviewId`, `content`, `score`,
/// `at`) into a raw review row.
///
/// Returns `None` when the payload has no review id or no text; callers
/// count those as skipped. The full payload is preserved on the row.
pub fn normalize_google_play(
    payload: &Value,
    source: &str,
    vertical: &str,
    lang: Option<&str>,
) -> Option<NewRawReview> {
    let review_id = payload.get("reviewId")?.as_str()?.trim();
    if review_id.is_empty() {
        return None;
    }

    let text = payload
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if text.is_empty() {
        return None;
    }

    let created_at = payload
        .get("at")
        .map(parse_timestamp_millis)
        .unwrap_or_else(now_millis);

    Some(NewRawReview {
        source: source.to_string(),
        source_review_id: review_id.to_string(),
        vertical: vertical.to_string(),
        created_at,
        ingested_at: now_millis(),
        rating: payload.get("score").and_then(Value::as_i64),
        language: lang.map(str::to_string),
        original_text: text.to_string(),
        raw_payload: Some(payload.clone()),
    })
}

/// Accept either epoch millis or an RFC 3339 string; anything else falls
/// back to the capture time.
fn parse_timestamp_millis(value: &Value) -> i64 {
    if let Some(millis) = value.as_i64() {
        return millis;
    }
    if let Some(text) = value.as_str() {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return dt.with_timezone(&Utc).timestamp_millis();
        }
    }
    now_millis()
}
