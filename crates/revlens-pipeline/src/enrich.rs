//! The enrichment sink: select raw reviews, run extraction and sentiment,
//! apply the guardrail, and persist the batch in one transaction.
//!
//! A failing review is logged and skipped; it never aborts the batch. The
//! store is only touched at selection and at the final persist, so no
//! connection lock is held while waiting on model calls.

use std::sync::Arc;

use tracing::{info, warn};

use revlens_core::{now_millis, Result, Sentiment};
use revlens_extract::{render_extraction_prompt, ExtractorBackend};
use revlens_sentiment::SentimentBackend;
use revlens_store::{EnrichedRecord, RawReview, ReviewStore};
use revlens_taxonomy::TaxonomyConfig;

use crate::guardrail::{apply_whitelist, assign_sentiment, tally_stakeholder_flags};

/// Summary of one enrichment run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Reviews selected and attempted, including failed ones.
    pub processed: usize,
    /// Rows actually written (inserted, or updated in force mode).
    pub inserted_or_updated: usize,
    /// Reviews skipped because extraction failed twice.
    pub extraction_failures: usize,
}

/// Drives enrichment over batches of raw reviews.
pub struct Enricher<E: ExtractorBackend> {
    store: Arc<ReviewStore>,
    taxonomy: TaxonomyConfig,
    extractor: E,
    sentiment: Arc<dyn SentimentBackend>,
    extract_model: String,
    prompt_version: String,
}

impl<E: ExtractorBackend> Enricher<E> {
    pub fn new(
        store: Arc<ReviewStore>,
        taxonomy: TaxonomyConfig,
        extractor: E,
        sentiment: Arc<dyn SentimentBackend>,
        extract_model: impl Into<String>,
        prompt_version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            taxonomy,
            extractor,
            sentiment,
            extract_model: extract_model.into(),
            prompt_version: prompt_version.into(),
        }
    }

    /// Enrich up to `batch_limit` reviews.
    ///
    /// Normal mode selects reviews with no enriched record, newest first,
    /// and skips identity conflicts on persist. Force mode selects the
    /// newest reviews regardless and overwrites existing enrichment, for
    /// re-analysis under a new model or prompt version.
    pub async fn run(&self, batch_limit: usize, force: bool) -> Result<EnrichReport> {
        let batch = if force {
            self.store.select_newest(batch_limit)?
        } else {
            self.store.select_unenriched(batch_limit)?
        };
        if batch.is_empty() {
            info!("Nothing to enrich (force={})", force);
            return Ok(EnrichReport::default());
        }

        let mut report = EnrichReport::default();
        let mut records = Vec::with_capacity(batch.len());

        for review in &batch {
            report.processed += 1;
            match self.enrich_one(review).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    report.extraction_failures += 1;
                    warn!(
                        "Skipping review {}/{}: {}",
                        review.source, review.source_review_id, e
                    );
                }
            }
        }

        report.inserted_or_updated = self.store.persist_enriched(&records, force)?;
        info!(
            "Enrichment done: processed={} written={} failures={} (force={})",
            report.processed, report.inserted_or_updated, report.extraction_failures, force
        );
        Ok(report)
    }

    async fn enrich_one(&self, review: &RawReview) -> Result<EnrichedRecord> {
        let view = self.taxonomy.effective(&review.vertical);
        let prompt = render_extraction_prompt(&review.vertical, &view, &review.original_text);
        let extraction = self.extractor.extract(&self.extract_model, &prompt).await?;

        let filtered = apply_whitelist(extraction, &view);
        let annotated = assign_sentiment(filtered, self.sentiment.as_ref());
        let flags = tally_stakeholder_flags(&annotated);

        Ok(EnrichedRecord {
            raw_id: review.id,
            source: review.source.clone(),
            source_review_id: review.source_review_id.clone(),
            vertical: review.vertical.clone(),
            created_at: review.created_at,
            analyzed_at: now_millis(),
            overall_sentiment: self.overall_sentiment(&review.original_text),
            aspects: serde_json::to_value(&annotated)?,
            stakeholder_flags: serde_json::to_value(&flags)?,
            model_version: self.extract_model.clone(),
            prompt_version: self.prompt_version.clone(),
        })
    }

    /// Overall sentiment of the full review text. Classifier trouble is
    /// non-fatal and degrades to Neutral.
    fn overall_sentiment(&self, text: &str) -> Sentiment {
        match self.sentiment.classify(&[text]) {
            Ok(predictions) => predictions
                .first()
                .map(|p| p.sentiment)
                .unwrap_or(Sentiment::Neutral),
            Err(e) => {
                warn!("Overall sentiment classification failed, defaulting Neutral: {}", e);
                Sentiment::Neutral
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use parking_lot::Mutex;
    use serde_json::json;
    use tempfile::TempDir;

    use revlens_core::Error;
    use revlens_extract::ExtractionResult;
    use revlens_sentiment::SentimentPrediction;
    use revlens_store::NewRawReview;

    /// Pops one pre-scripted outcome per extraction call.
    struct ScriptedExtractor {
        outcomes: Mutex<VecDeque<Result<ExtractionResult>>>,
    }

    impl ScriptedExtractor {
        fn new(outcomes: Vec<Result<ExtractionResult>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
            }
        }
    }

    impl ExtractorBackend for ScriptedExtractor {
        async fn extract(&self, _model: &str, _prompt: &str) -> Result<ExtractionResult> {
            self.outcomes
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Extraction("script exhausted".into())))
        }
    }

    struct PositiveBackend;

    impl SentimentBackend for PositiveBackend {
        fn classify(&self, texts: &[&str]) -> Result<Vec<SentimentPrediction>> {
            Ok(texts
                .iter()
                .map(|_| SentimentPrediction {
                    sentiment: Sentiment::Positive,
                    stars: Some(5),
                    confidence: 0.9,
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "positive"
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn taxonomy() -> TaxonomyConfig {
        TaxonomyConfig::from_str(
            r#"{
                "global_aspects": ["delivery_time", "packaging"],
                "global_stakeholders": {"logistics": ["delivery_time", "packaging"]},
                "verticals": {"food": {}}
            }"#,
        )
        .unwrap()
    }

    fn seeded_store(ids_newest_last: &[&str]) -> (Arc<ReviewStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ReviewStore::open(dir.path().join("revlens.db")).unwrap();
        for (i, id) in ids_newest_last.iter().enumerate() {
            store
                .insert_raw(&NewRawReview {
                    source: "google_play".into(),
                    source_review_id: (*id).into(),
                    vertical: "food".into(),
                    created_at: 1_000 + i as i64,
                    ingested_at: 2_000,
                    original_text: format!("review text {}", id),
                    ..Default::default()
                })
                .unwrap();
        }
        (Arc::new(store), dir)
    }

    fn extraction_with(aspect: &str) -> ExtractionResult {
        serde_json::from_value(json!({
            "mentioned_aspects": [
                {"aspect": aspect, "evidence": "the rice was late", "confidence": 0.8}
            ],
            "unmapped_issues": []
        }))
        .unwrap()
    }

    fn enricher(
        store: Arc<ReviewStore>,
        outcomes: Vec<Result<ExtractionResult>>,
    ) -> Enricher<ScriptedExtractor> {
        Enricher::new(
            store,
            taxonomy(),
            ScriptedExtractor::new(outcomes),
            Arc::new(PositiveBackend),
            "mistral:7b-instruct",
            "v1",
        )
    }

    #[tokio::test]
    async fn enriches_batch_and_persists_processed_records() {
        let (store, _dir) = seeded_store(&["old", "new"]);
        // Selection is newest first: "new" then "old".
        let e = enricher(
            store.clone(),
            vec![
                Ok(extraction_with("delivery_time")),
                Ok(extraction_with("packaging")),
            ],
        );

        let report = e.run(10, false).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.inserted_or_updated, 2);
        assert_eq!(report.extraction_failures, 0);

        let stored = store.get_enriched("google_play", "new").unwrap().unwrap();
        assert_eq!(stored.overall_sentiment, Sentiment::Positive);
        assert_eq!(stored.aspects["mentioned_aspects"][0]["aspect"], "delivery_time");
        assert_eq!(stored.aspects["mentioned_aspects"][0]["stakeholder"], "product");
        assert_eq!(stored.aspects["mentioned_aspects"][0]["sentiment"], "Positive");
        assert_eq!(stored.stakeholder_flags["product"]["Positive"], 1);
        assert_eq!(stored.model_version.as_deref(), Some("mistral:7b-instruct"));
        assert_eq!(stored.prompt_version.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn failed_extraction_is_isolated_and_counted() {
        let (store, _dir) = seeded_store(&["old", "new"]);
        let e = enricher(
            store.clone(),
            vec![
                Err(Error::Extraction("no recoverable JSON after two attempts".into())),
                Ok(extraction_with("delivery_time")),
            ],
        );

        let report = e.run(10, false).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.extraction_failures, 1);
        assert_eq!(report.inserted_or_updated, 1);

        // The failed review ("new", extracted first) is absent.
        assert!(store.get_enriched("google_play", "new").unwrap().is_none());
        assert!(store.get_enriched("google_play", "old").unwrap().is_some());
    }

    #[tokio::test]
    async fn normal_rerun_is_idempotent() {
        let (store, _dir) = seeded_store(&["only"]);
        let e = enricher(store.clone(), vec![Ok(extraction_with("delivery_time"))]);
        let first = e.run(10, false).await.unwrap();
        assert_eq!(first.inserted_or_updated, 1);

        // Nothing left unenriched; the script is not consulted again.
        let second = e.run(10, false).await.unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.inserted_or_updated, 0);
        assert_eq!(store.count_enriched().unwrap(), 1);
    }

    #[tokio::test]
    async fn force_rerun_overwrites_enrichment() {
        let (store, _dir) = seeded_store(&["only"]);
        let first = enricher(store.clone(), vec![Ok(extraction_with("delivery_time"))]);
        first.run(10, false).await.unwrap();

        let second = Enricher::new(
            store.clone(),
            taxonomy(),
            ScriptedExtractor::new(vec![Ok(extraction_with("packaging"))]),
            Arc::new(PositiveBackend),
            "mistral:latest",
            "v2",
        );
        let report = second.run(10, true).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.inserted_or_updated, 1);

        let stored = store.get_enriched("google_play", "only").unwrap().unwrap();
        assert_eq!(stored.model_version.as_deref(), Some("mistral:latest"));
        assert_eq!(stored.prompt_version.as_deref(), Some("v2"));
        assert_eq!(stored.aspects["mentioned_aspects"][0]["aspect"], "packaging");
        assert_eq!(store.count_enriched().unwrap(), 1);
    }

    #[tokio::test]
    async fn guardrail_rejections_reach_storage_as_unmapped_issues() {
        let (store, _dir) = seeded_store(&["only"]);
        let e = enricher(store.clone(), vec![Ok(extraction_with("rider_rudeness"))]);
        let report = e.run(10, false).await.unwrap();
        assert_eq!(report.inserted_or_updated, 1);

        let stored = store.get_enriched("google_play", "only").unwrap().unwrap();
        assert_eq!(stored.aspects["mentioned_aspects"], json!([]));
        assert_eq!(
            stored.aspects["unmapped_issues"][0]["issue"],
            "non_whitelisted_aspect:rider_rudeness"
        );
        assert_eq!(stored.stakeholder_flags, json!({}));
    }

    #[tokio::test]
    async fn batch_limit_bounds_selection() {
        let (store, _dir) = seeded_store(&["a", "b", "c"]);
        let e = enricher(store.clone(), vec![Ok(extraction_with("delivery_time"))]);
        let report = e.run(1, false).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(store.count_enriched().unwrap(), 1);
        // Newest review was picked.
        assert!(store.get_enriched("google_play", "c").unwrap().is_some());
    }
}
