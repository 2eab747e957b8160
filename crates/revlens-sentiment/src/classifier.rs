//! Backend trait and prediction shape for sentiment classification.

use serde::{Deserialize, Serialize};

use revlens_core::{Result, Sentiment};

use crate::labels::{label_name_to_sentiment, stars_to_sentiment};

/// One classification outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPrediction {
    pub sentiment: Sentiment,
    /// Present only for 5-class star models.
    pub stars: Option<u8>,
    /// Probability of the winning class.
    pub confidence: f32,
}

impl SentimentPrediction {
    pub fn neutral() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            stars: None,
            confidence: 0.0,
        }
    }
}

/// Map an argmax class to a prediction under the model's label scheme.
///
/// 5-class models are read as star ratings; any other class count goes
/// through named-label matching on `id2label`.
pub fn map_winning_class(
    num_labels: usize,
    id2label: &dyn Fn(usize) -> Option<String>,
    index: usize,
    confidence: f32,
) -> SentimentPrediction {
    if num_labels == 5 {
        let stars = index as u8 + 1;
        SentimentPrediction {
            sentiment: stars_to_sentiment(stars),
            stars: Some(stars),
            confidence,
        }
    } else {
        let name = id2label(index).unwrap_or_else(|| format!("label_{}", index));
        SentimentPrediction {
            sentiment: label_name_to_sentiment(&name),
            stars: None,
            confidence,
        }
    }
}

/// Trait for sentiment inference backends.
pub trait SentimentBackend: Send + Sync {
    /// Classify a batch of texts. The result has the same length and
    /// order as the input; an empty batch yields an empty result.
    fn classify(&self, texts: &[&str]) -> Result<Vec<SentimentPrediction>>;

    /// Model identifier for logging.
    fn model_name(&self) -> &str;

    /// Whether a real model is loaded.
    fn is_available(&self) -> bool;
}

/// Degraded-mode backend: everything Neutral at 0.0 confidence.
pub struct NeutralBackend;

impl SentimentBackend for NeutralBackend {
    fn classify(&self, texts: &[&str]) -> Result<Vec<SentimentPrediction>> {
        Ok(texts.iter().map(|_| SentimentPrediction::neutral()).collect())
    }

    fn model_name(&self) -> &str {
        "neutral-fallback"
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_class_model_maps_index_to_stars() {
        let none = |_: usize| None;
        let p = map_winning_class(5, &none, 0, 0.91);
        assert_eq!(p.sentiment, Sentiment::Negative);
        assert_eq!(p.stars, Some(1));
        assert!((p.confidence - 0.91).abs() < 1e-6);

        let p = map_winning_class(5, &none, 4, 0.6);
        assert_eq!(p.sentiment, Sentiment::Positive);
        assert_eq!(p.stars, Some(5));
    }

    #[test]
    fn named_label_model_maps_by_name() {
        let labels = |i: usize| match i {
            0 => Some("NEG".to_string()),
            1 => Some("NEU".to_string()),
            2 => Some("POS".to_string()),
            _ => None,
        };
        assert_eq!(map_winning_class(3, &labels, 0, 0.8).sentiment, Sentiment::Negative);
        assert_eq!(map_winning_class(3, &labels, 1, 0.8).sentiment, Sentiment::Neutral);
        assert_eq!(map_winning_class(3, &labels, 2, 0.8).sentiment, Sentiment::Positive);
        assert_eq!(map_winning_class(3, &labels, 0, 0.8).stars, None);
    }

    #[test]
    fn synthesized_label_name_goes_through_star_digit_fallback() {
        let none = |_: usize| None;
        // "label_1" carries a star digit, so it maps through the star scheme.
        assert_eq!(map_winning_class(3, &none, 1, 0.5).sentiment, Sentiment::Negative);
        // A digit-free synthesized name defaults to Neutral.
        assert_eq!(map_winning_class(7, &none, 6, 0.5).sentiment, Sentiment::Neutral);
    }

    #[test]
    fn neutral_backend_preserves_length_and_order() {
        let backend = NeutralBackend;
        let out = backend.classify(&["a", "b", "c"]).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|p| p.sentiment == Sentiment::Neutral && p.confidence == 0.0));
        assert!(backend.classify(&[]).unwrap().is_empty());
        assert!(!backend.is_available());
    }
}
