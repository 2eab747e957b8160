//! Capture run: fetch from a source, normalize, insert-or-skip.

use tracing::info;

use revlens_core::Result;
use revlens_store::ReviewStore;

use crate::normalize::normalize_google_play;
use crate::source::ReviewSource;

/// Summary of one capture run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Payloads the source returned.
    pub fetched: usize,
    /// New rows written.
    pub inserted: usize,
    /// Payloads rejected by normalization (no id or no text).
    pub skipped_invalid: usize,
    /// Identity conflicts silently skipped.
    pub skipped_existing: usize,
}

/// Handles review capture into the raw store.
pub struct Ingestor<'a> {
    store: &'a ReviewStore,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a ReviewStore) -> Self {
        Self { store }
    }

    /// Fetch, normalize, and store one batch from the source.
    ///
    /// Re-running over an overlapping batch is safe: existing identities
    /// are skipped by the store's conflict handling.
    pub async fn run<S: ReviewSource>(
        &self,
        source: &S,
        vertical: &str,
        lang: Option<&str>,
    ) -> Result<IngestReport> {
        let payloads = source.fetch().await?;
        let mut report = IngestReport {
            fetched: payloads.len(),
            ..Default::default()
        };

        for payload in &payloads {
            let row = match normalize_google_play(payload, source.source_name(), vertical, lang) {
                Some(row) => row,
                None => {
                    report.skipped_invalid += 1;
                    continue;
                }
            };

            if self.store.insert_raw(&row)? {
                report.inserted += 1;
            } else {
                report.skipped_existing += 1;
            }
        }

        info!(
            "Ingest done: fetched={} inserted={} skipped_invalid={} skipped_existing={}",
            report.fetched, report.inserted, report.skipped_invalid, report.skipped_existing
        );
        Ok(report)
    }
}
