//! Failure artifacts for offline inspection of unrecoverable extractions.

use std::io::Write;
use std::path::{Path, PathBuf};

/// One exhausted extraction attempt.
#[derive(Debug, Clone, Default)]
pub struct FailedAttempt {
    /// Raw response text, if the call got that far.
    pub raw: Option<String>,
    /// Repaired candidate that still failed to parse, if one was produced.
    pub candidate: Option<String>,
    /// Short reason (HTTP failure, no object found, parse error).
    pub reason: String,
}

/// Persist the raw and candidate text of every exhausted attempt.
///
/// Returns the artifact path so the caller can log it.
pub fn write_failure_artifact(
    dir: &Path,
    attempts: &[FailedAttempt],
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "extract-failure-{}.txt",
        revlens_core::now_millis()
    ));
    let mut file = std::fs::File::create(&path)?;
    for (i, attempt) in attempts.iter().enumerate() {
        writeln!(file, "== attempt {} ==", i + 1)?;
        writeln!(file, "reason: {}", attempt.reason)?;
        writeln!(file, "-- raw --")?;
        writeln!(file, "{}", attempt.raw.as_deref().unwrap_or("<no response>"))?;
        writeln!(file, "-- candidate --")?;
        writeln!(
            file,
            "{}",
            attempt.candidate.as_deref().unwrap_or("<no candidate>")
        )?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn artifact_contains_both_attempts() {
        let dir = TempDir::new().unwrap();
        let attempts = vec![
            FailedAttempt {
                raw: Some("garbage one".into()),
                candidate: Some("{broken".into()),
                reason: "parse error".into(),
            },
            FailedAttempt {
                raw: Some("garbage two".into()),
                candidate: None,
                reason: "no JSON object found".into(),
            },
        ];
        let path = write_failure_artifact(dir.path(), &attempts).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("== attempt 1 =="));
        assert!(content.contains("garbage one"));
        assert!(content.contains("{broken"));
        assert!(content.contains("== attempt 2 =="));
        assert!(content.contains("<no candidate>"));
    }
}
