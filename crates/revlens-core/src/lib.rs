//! Shared error taxonomy, sentiment labels, and configuration for RevLens.

pub mod config;
pub mod error;
pub mod sentiment;

pub use config::{DataPaths, RevlensConfig};
pub use error::{Error, Result};
pub use sentiment::Sentiment;

/// Current UTC time as epoch milliseconds, the timestamp unit used
/// throughout the store.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
