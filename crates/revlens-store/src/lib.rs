//! SQLite persistence for raw reviews and their enriched records.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::ReviewStore;
pub use types::{EnrichedRecord, EnrichedReview, NewRawReview, RawReview};
