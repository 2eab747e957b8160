//! Mapping from model output schemes to the three-way sentiment label.
//!
//! Two schemes are supported: 5-class star-rating models (class index 0–4
//! maps to 1–5 stars) and N-class named-label models, resolved by
//! substring matching with a star-pattern fallback.

use revlens_core::Sentiment;

/// Star thresholds: 1–2 Negative, 3 Neutral, 4–5 Positive.
pub fn stars_to_sentiment(stars: u8) -> Sentiment {
    match stars {
        0..=2 => Sentiment::Negative,
        3 => Sentiment::Neutral,
        _ => Sentiment::Positive,
    }
}

/// Normalize a model's label name (`"NEG"`, `"neutral"`, `"LABEL_2"`,
/// `"4 stars"`, ...) into a sentiment. Defaults to Neutral when nothing
/// matches.
pub fn label_name_to_sentiment(name: &str) -> Sentiment {
    let s = name.trim().to_lowercase();

    if s.contains("neg") {
        return Sentiment::Negative;
    }
    if s.contains("neu") {
        return Sentiment::Neutral;
    }
    if s.contains("pos") {
        return Sentiment::Positive;
    }

    // Star-like label names: "1 star", "star_5", ...
    for digit in ['1', '2', '3', '4', '5'] {
        if s.contains(digit) {
            return stars_to_sentiment(digit as u8 - b'0');
        }
    }

    Sentiment::Neutral
}

/// Softmax over raw logits.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// Index and value of the highest probability.
pub fn argmax(probs: &[f32]) -> Option<(usize, f32)> {
    probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
