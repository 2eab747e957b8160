//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Paths to all RevLens data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database file (`data/revlens.db`).
    pub db_file: PathBuf,
    /// Vertical taxonomy document (`data/verticals.json`).
    pub verticals_file: PathBuf,
    /// Extraction failure artifacts (`data/diagnostics/`).
    pub diagnostics: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db_file: root.join("revlens.db"),
            verticals_file: root.join("verticals.json"),
            diagnostics: root.join("diagnostics"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.diagnostics)?;
        Ok(())
    }
}

/// Top-level RevLens configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevlensConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Base URL of the text-generation service.
    pub generate_url: String,
    /// Extraction model name, recorded as `model_version` on enriched rows.
    pub extract_model: String,
    /// Prompt template revision, recorded as `prompt_version`.
    pub prompt_version: String,
    /// Connect timeout for the extraction call.
    pub connect_timeout: Duration,
    /// Read timeout for the extraction call, distinct from connect.
    pub read_timeout: Duration,
    /// Directory holding the sentiment model (`model.onnx`, `tokenizer.json`,
    /// `config.json`), if one is installed.
    pub sentiment_model_dir: Option<PathBuf>,
}

impl RevlensConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;

        let generate_url = std::env::var("REVLENS_GENERATE_URL")
            .unwrap_or_else(|_| "http://localhost:11434/api/generate".to_string());
        let extract_model = std::env::var("REVLENS_EXTRACT_MODEL")
            .unwrap_or_else(|_| "mistral:7b-instruct".to_string());
        let prompt_version =
            std::env::var("REVLENS_PROMPT_VERSION").unwrap_or_else(|_| "v1".to_string());

        let connect_timeout = Duration::from_secs(env_secs("REVLENS_CONNECT_TIMEOUT_SECS", 5));
        let read_timeout = Duration::from_secs(env_secs("REVLENS_READ_TIMEOUT_SECS", 60));

        let sentiment_model_dir = std::env::var("REVLENS_SENTIMENT_MODEL_DIR")
            .ok()
            .map(PathBuf::from);

        Ok(Self {
            data_paths,
            generate_url,
            extract_model,
            prompt_version,
            connect_timeout,
            read_timeout,
            sentiment_model_dir,
        })
    }
}

fn env_secs(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_paths_create_dirs() {
        let dir = std::env::temp_dir().join(format!("revlens-cfg-{}", std::process::id()));
        let paths = DataPaths::new(&dir).unwrap();
        assert!(paths.root.is_dir());
        assert!(paths.diagnostics.is_dir());
        assert_eq!(paths.db_file.file_name().unwrap(), "revlens.db");
        std::fs::remove_dir_all(&dir).ok();
    }
}
