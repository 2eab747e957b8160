//! Full pipeline run: ingest, then enrich, sequentially.

use tracing::info;

use revlens_core::Result;
use revlens_extract::ExtractorBackend;
use revlens_ingest::{IngestReport, Ingestor, ReviewSource};
use revlens_store::ReviewStore;

use crate::enrich::{EnrichReport, Enricher};

/// Combined summary of a full run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineReport {
    pub ingest: IngestReport,
    pub enrich: EnrichReport,
}

/// Run the capture step and then the enrichment step.
///
/// The steps are strictly sequential and the first failure fails the
/// whole run; per-review extraction failures inside the enrichment step
/// stay contained as usual.
pub async fn run_pipeline<S: ReviewSource, E: ExtractorBackend>(
    store: &ReviewStore,
    source: &S,
    vertical: &str,
    lang: Option<&str>,
    enricher: &Enricher<E>,
    batch_limit: usize,
    force: bool,
) -> Result<PipelineReport> {
    let ingest = Ingestor::new(store).run(source, vertical, lang).await?;
    let enrich = enricher.run(batch_limit, force).await?;
    info!(
        "Pipeline run done: ingested={} enriched={}",
        ingest.inserted, enrich.inserted_or_updated
    );
    Ok(PipelineReport { ingest, enrich })
}
