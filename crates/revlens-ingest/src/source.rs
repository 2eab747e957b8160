//! The review source seam.
//!
//! Live scraping is an external collaborator; the pipeline only depends
//! on this interface. `JsonFileSource` replays an exported batch of
//! reviews, which is also what the tests use.

use std::future::Future;
use std::path::PathBuf;

use revlens_core::{Error, Result};

/// A producer of raw review payloads for one capture run.
pub trait ReviewSource: Send + Sync {
    /// Fetch the newest batch of source-shaped payloads.
    fn fetch(&self) -> impl Future<Output = Result<Vec<serde_json::Value>>> + Send;

    /// Source tag stored on every captured review (e.g. `"google_play"`).
    fn source_name(&self) -> &str;
}

/// Replays a JSON export file containing an array of review payloads.
pub struct JsonFileSource {
    path: PathBuf,
    source_name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, source_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source_name: source_name.into(),
        }
    }
}

impl ReviewSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<serde_json::Value>> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Ingest(format!("cannot read {}: {}", self.path.display(), e)))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| Error::Ingest(format!("invalid export {}: {}", self.path.display(), e)))?;
        match value {
            serde_json::Value::Array(rows) => Ok(rows),
            _ => Err(Error::Ingest(format!(
                "export {} is not a JSON array",
                self.path.display()
            ))),
        }
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}
