//! Review ingestion: the source interface, payload normalization, and the
//! insert-or-skip capture run.

pub mod ingest;
pub mod normalize;
pub mod source;

pub use ingest::{IngestReport, Ingestor};
pub use normalize::normalize_google_play;
pub use source::{JsonFileSource, ReviewSource};
