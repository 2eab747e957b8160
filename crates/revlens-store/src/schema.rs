//! Database schema SQL.
//!
//! Both tables carry a UNIQUE constraint on the natural identity
//! `(source, source_review_id)`; every conflict-safe write in the store
//! leans on it instead of application-level locking.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS reviews_raw (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    source_review_id TEXT NOT NULL,
    vertical TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    ingested_at INTEGER NOT NULL,
    rating INTEGER,
    language TEXT,
    original_text TEXT NOT NULL,
    raw_payload TEXT,
    UNIQUE (source, source_review_id)
);

CREATE INDEX IF NOT EXISTS idx_reviews_raw_vertical_created
    ON reviews_raw(vertical, created_at);

CREATE TABLE IF NOT EXISTS reviews_enriched (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    raw_id INTEGER NOT NULL REFERENCES reviews_raw(id),
    source TEXT NOT NULL,
    source_review_id TEXT NOT NULL,
    vertical TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    analyzed_at INTEGER NOT NULL,
    overall_sentiment TEXT NOT NULL,
    aspects_json TEXT NOT NULL,
    stakeholder_flags_json TEXT NOT NULL,
    model_version TEXT,
    prompt_version TEXT,
    UNIQUE (source, source_review_id)
);

CREATE INDEX IF NOT EXISTS idx_reviews_enriched_vertical_created
    ON reviews_enriched(vertical, created_at);
CREATE INDEX IF NOT EXISTS idx_reviews_enriched_sentiment
    ON reviews_enriched(overall_sentiment);
"#;
