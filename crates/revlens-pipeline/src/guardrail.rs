//! Whitelist guardrail and stakeholder aggregation.
//!
//! The extraction model is untrusted; nothing it proposes reaches storage
//! unless the aspect is in the vertical's declared vocabulary. Each stage
//! here is a pure transform over the extraction payload so the stages can
//! be tested in isolation: whitelist filter, then sentiment annotation,
//! then the stakeholder tally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use revlens_core::Sentiment;
use revlens_extract::{ExtractionResult, UnmappedIssue};
use revlens_sentiment::SentimentBackend;
use revlens_taxonomy::VerticalView;

/// Team assigned when neither the model nor the taxonomy names an owner.
pub const FALLBACK_STAKEHOLDER: &str = "product";

/// Evidence snippets longer than this are truncated before classification.
pub const EVIDENCE_MAX_CHARS: usize = 500;

/// Drop mentions whose aspect is outside the allowed vocabulary.
///
/// Rejected mentions are preserved as unmapped issues tagged with the
/// offending aspect name (or `missing` when the field was blank), keeping
/// their trimmed evidence and model confidence for audit. Existing
/// unmapped issues are kept; rejections are appended after them. Kept
/// mentions get their aspect trimmed and a blank stakeholder replaced
/// with `"product"`.
pub fn apply_whitelist(raw: ExtractionResult, view: &VerticalView) -> ExtractionResult {
    let mut kept = Vec::with_capacity(raw.mentioned_aspects.len());
    let mut unmapped = raw.unmapped_issues;

    for mut mention in raw.mentioned_aspects {
        let aspect = mention.aspect.trim().to_string();
        if aspect.is_empty() || !view.is_allowed(&aspect) {
            let tag = if aspect.is_empty() {
                "non_whitelisted_aspect:missing".to_string()
            } else {
                format!("non_whitelisted_aspect:{}", aspect)
            };
            let confidence = mention.extraction_confidence();
            unmapped.push(UnmappedIssue {
                issue: tag,
                evidence: mention.evidence.trim().to_string(),
                confidence,
            });
            continue;
        }

        mention.aspect = aspect;
        if mention.stakeholder.trim().is_empty() {
            mention.stakeholder = FALLBACK_STAKEHOLDER.to_string();
        }
        kept.push(mention);
    }

    ExtractionResult {
        mentioned_aspects: kept,
        unmapped_issues: unmapped,
        extra: raw.extra,
    }
}

/// Score each kept mention's evidence and annotate the mention.
///
/// Empty evidence gets Neutral at 0.0 confidence without touching the
/// classifier. A classifier failure degrades the whole batch to the same
/// Neutral default rather than failing the review.
pub fn assign_sentiment(
    filtered: ExtractionResult,
    backend: &dyn SentimentBackend,
) -> ExtractionResult {
    let mut mentions = filtered.mentioned_aspects;

    let snippets: Vec<(usize, String)> = mentions
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.evidence.trim().is_empty())
        .map(|(i, m)| (i, m.evidence.chars().take(EVIDENCE_MAX_CHARS).collect()))
        .collect();

    for mention in mentions.iter_mut() {
        mention.sentiment = Some(Sentiment::Neutral);
        mention.sentiment_confidence = Some(0.0);
    }

    if !snippets.is_empty() {
        let texts: Vec<&str> = snippets.iter().map(|(_, s)| s.as_str()).collect();
        match backend.classify(&texts) {
            Ok(predictions) => {
                for ((index, _), prediction) in snippets.iter().zip(predictions) {
                    mentions[*index].sentiment = Some(prediction.sentiment);
                    mentions[*index].sentiment_confidence = Some(prediction.confidence);
                }
            }
            Err(e) => {
                warn!("Aspect sentiment classification failed, defaulting Neutral: {}", e);
            }
        }
    }

    ExtractionResult {
        mentioned_aspects: mentions,
        unmapped_issues: filtered.unmapped_issues,
        extra: filtered.extra,
    }
}

/// Per-stakeholder sentiment counts. Every bucket carries all three keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentTally {
    #[serde(rename = "Positive")]
    pub positive: u32,
    #[serde(rename = "Neutral")]
    pub neutral: u32,
    #[serde(rename = "Negative")]
    pub negative: u32,
}

impl SentimentTally {
    fn bump(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }
}

/// Tally kept mentions by `(stakeholder, sentiment)`.
///
/// A mention with no assigned sentiment counts as Neutral. Every mention
/// contributes exactly one increment, so the grand total equals the number
/// of kept mentions.
pub fn tally_stakeholder_flags(result: &ExtractionResult) -> BTreeMap<String, SentimentTally> {
    let mut flags: BTreeMap<String, SentimentTally> = BTreeMap::new();
    for mention in &result.mentioned_aspects {
        let sentiment = mention.sentiment.unwrap_or(Sentiment::Neutral);
        flags
            .entry(mention.stakeholder.clone())
            .or_default()
            .bump(sentiment);
    }
    flags
}
