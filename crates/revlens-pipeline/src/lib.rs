//! The enrichment pipeline: whitelist guardrail, stakeholder aggregation,
//! batch sink, job registry, and the sequential ingest-then-enrich runner.

pub mod enrich;
pub mod guardrail;
pub mod jobs;
pub mod runner;

pub use enrich::{EnrichReport, Enricher};
pub use guardrail::{
    apply_whitelist, assign_sentiment, tally_stakeholder_flags, SentimentTally,
    EVIDENCE_MAX_CHARS, FALLBACK_STAKEHOLDER,
};
pub use jobs::{Job, JobRegistry, JobState};
pub use runner::{run_pipeline, PipelineReport};
