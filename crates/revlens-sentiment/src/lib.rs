//! Sentiment classification over review text and aspect evidence.
//!
//! The `SentimentBackend` trait abstracts over model inference.
//! Implementations:
//! - `OnnxSentimentClassifier`: ONNX Runtime sequence classifier (requires the `onnx` feature)
//! - `NeutralBackend`: degraded mode, everything Neutral at 0.0 confidence

pub mod classifier;
pub mod labels;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use classifier::{NeutralBackend, SentimentBackend, SentimentPrediction};
#[cfg(feature = "onnx")]
pub use onnx::OnnxSentimentClassifier;
