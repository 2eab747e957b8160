//! SQLite-backed review store.
//!
//! Conflict safety comes from the UNIQUE `(source, source_review_id)`
//! constraints: raw ingest and normal-mode enrichment use
//! `ON CONFLICT DO NOTHING`, force-mode enrichment uses
//! `ON CONFLICT DO UPDATE` over every enrichment field. Batch persistence
//! runs in a single transaction, and no connection lock is held while the
//! pipeline waits on model calls.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use revlens_core::{Error, Result, Sentiment};

use crate::schema::SCHEMA_SQL;
use crate::types::*;

/// SQLite store for raw and enriched reviews.
pub struct ReviewStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl ReviewStore {
    /// Open or create the store at the given database file path.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let raw_count = store.count_raw()?;
        let enriched_count = store.count_enriched()?;
        info!(
            "ReviewStore initialized: {} raw, {} enriched, path={}",
            raw_count,
            enriched_count,
            store.db_path.display()
        );

        Ok(store)
    }

    // ---------------------------------------------------------------
    // Raw reviews
    // ---------------------------------------------------------------

    /// Insert a raw review. Returns true if inserted, false if the
    /// identity already existed (insert is silently skipped).
    pub fn insert_raw(&self, review: &NewRawReview) -> Result<bool> {
        let payload_json = review
            .raw_payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock();
        let changed = conn
            .prepare_cached(
                "INSERT INTO reviews_raw \
                 (source, source_review_id, vertical, created_at, ingested_at, \
                  rating, language, original_text, raw_payload) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(source, source_review_id) DO NOTHING",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![
                review.source,
                review.source_review_id,
                review.vertical,
                review.created_at,
                review.ingested_at,
                review.rating,
                review.language,
                review.original_text,
                payload_json,
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(changed == 1)
    }

    /// Raw reviews with no corresponding enriched record, newest first.
    pub fn select_unenriched(&self, limit: usize) -> Result<Vec<RawReview>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT r.* FROM reviews_raw r \
                 LEFT JOIN reviews_enriched e \
                   ON e.source = r.source AND e.source_review_id = r.source_review_id \
                 WHERE e.id IS NULL \
                 ORDER BY r.created_at DESC LIMIT ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| Ok(Self::row_to_raw(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Newest raw reviews regardless of enrichment (force-mode selection).
    pub fn select_newest(&self, limit: usize) -> Result<Vec<RawReview>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM reviews_raw ORDER BY created_at DESC LIMIT ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| Ok(Self::row_to_raw(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_raw(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM reviews_raw", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Enriched records
    // ---------------------------------------------------------------

    /// Persist a batch of enriched records in one transaction.
    ///
    /// Normal mode inserts and silently skips identity conflicts; force
    /// mode overwrites every enrichment field on conflict. Returns the
    /// number of rows inserted or updated.
    pub fn persist_enriched(&self, records: &[EnrichedRecord], force: bool) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = if force {
            "INSERT INTO reviews_enriched \
             (raw_id, source, source_review_id, vertical, created_at, analyzed_at, \
              overall_sentiment, aspects_json, stakeholder_flags_json, model_version, prompt_version) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             ON CONFLICT(source, source_review_id) DO UPDATE SET \
               raw_id = excluded.raw_id, \
               vertical = excluded.vertical, \
               created_at = excluded.created_at, \
               analyzed_at = excluded.analyzed_at, \
               overall_sentiment = excluded.overall_sentiment, \
               aspects_json = excluded.aspects_json, \
               stakeholder_flags_json = excluded.stakeholder_flags_json, \
               model_version = excluded.model_version, \
               prompt_version = excluded.prompt_version"
        } else {
            "INSERT INTO reviews_enriched \
             (raw_id, source, source_review_id, vertical, created_at, analyzed_at, \
              overall_sentiment, aspects_json, stakeholder_flags_json, model_version, prompt_version) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             ON CONFLICT(source, source_review_id) DO NOTHING"
        };

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut written = 0usize;
        {
            let mut stmt = tx
                .prepare_cached(sql)
                .map_err(|e| Error::Database(e.to_string()))?;
            for record in records {
                let aspects_json = serde_json::to_string(&record.aspects)?;
                let flags_json = serde_json::to_string(&record.stakeholder_flags)?;
                let changed = stmt
                    .execute(params![
                        record.raw_id,
                        record.source,
                        record.source_review_id,
                        record.vertical,
                        record.created_at,
                        record.analyzed_at,
                        record.overall_sentiment.as_str(),
                        aspects_json,
                        flags_json,
                        record.model_version,
                        record.prompt_version,
                    ])
                    .map_err(|e| Error::Database(e.to_string()))?;
                written += changed.min(1);
            }
        }

        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!(
            "Persisted enriched batch: {}/{} written (force={})",
            written,
            records.len(),
            force
        );
        Ok(written)
    }

    /// Look up an enriched record by natural identity.
    pub fn get_enriched(
        &self,
        source: &str,
        source_review_id: &str,
    ) -> Result<Option<EnrichedReview>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT * FROM reviews_enriched \
                 WHERE source = ?1 AND source_review_id = ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![source, source_review_id], |row| {
                Ok(Self::row_to_enriched(row))
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    pub fn count_enriched(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM reviews_enriched", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Row mapping helpers
    // ---------------------------------------------------------------

    fn row_to_raw(row: &rusqlite::Row<'_>) -> RawReview {
        RawReview {
            id: row.get("id").unwrap_or(0),
            source: row.get("source").unwrap_or_default(),
            source_review_id: row.get("source_review_id").unwrap_or_default(),
            vertical: row.get("vertical").unwrap_or_default(),
            created_at: row.get("created_at").unwrap_or(0),
            ingested_at: row.get("ingested_at").unwrap_or(0),
            rating: row.get("rating").ok().flatten(),
            language: row.get("language").ok().flatten(),
            original_text: row.get("original_text").unwrap_or_default(),
            raw_payload: row
                .get::<_, Option<String>>("raw_payload")
                .ok()
                .flatten()
                .and_then(|s| serde_json::from_str(&s).ok()),
        }
    }

    fn row_to_enriched(row: &rusqlite::Row<'_>) -> EnrichedReview {
        EnrichedReview {
            id: row.get("id").unwrap_or(0),
            raw_id: row.get("raw_id").unwrap_or(0),
            source: row.get("source").unwrap_or_default(),
            source_review_id: row.get("source_review_id").unwrap_or_default(),
            vertical: row.get("vertical").unwrap_or_default(),
            created_at: row.get("created_at").unwrap_or(0),
            analyzed_at: row.get("analyzed_at").unwrap_or(0),
            overall_sentiment: row
                .get::<_, String>("overall_sentiment")
                .map(|s| Sentiment::parse_or_neutral(&s))
                .unwrap_or(Sentiment::Neutral),
            aspects: row
                .get::<_, String>("aspects_json")
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or(serde_json::Value::Null),
            stakeholder_flags: row
                .get::<_, String>("stakeholder_flags_json")
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or(serde_json::Value::Null),
            model_version: row.get("model_version").ok().flatten(),
            prompt_version: row.get("prompt_version").ok().flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_store() -> (ReviewStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ReviewStore::open(dir.path().join("revlens.db")).unwrap();
        (store, dir)
    }

    fn raw(id: &str, created_at: i64) -> NewRawReview {
        NewRawReview {
            source: "google_play".into(),
            source_review_id: id.into(),
            vertical: "food".into(),
            created_at,
            ingested_at: created_at + 10,
            rating: Some(4),
            language: Some("en".into()),
            original_text: format!("review {}", id),
            raw_payload: Some(json!({"reviewId": id})),
        }
    }

    fn enriched(raw_id: i64, review_id: &str, model: &str) -> EnrichedRecord {
        EnrichedRecord {
            raw_id,
            source: "google_play".into(),
            source_review_id: review_id.into(),
            vertical: "food".into(),
            created_at: 1_000,
            analyzed_at: 2_000,
            overall_sentiment: Sentiment::Positive,
            aspects: json!({"mentioned_aspects": [], "unmapped_issues": []}),
            stakeholder_flags: json!({}),
            model_version: model.into(),
            prompt_version: "v1".into(),
        }
    }

    #[test]
    fn raw_insert_is_idempotent() {
        let (store, _dir) = test_store();
        assert!(store.insert_raw(&raw("r1", 1_000)).unwrap());
        assert!(!store.insert_raw(&raw("r1", 1_000)).unwrap());
        assert_eq!(store.count_raw().unwrap(), 1);
    }

    #[test]
    fn unenriched_selection_is_newest_first_and_excludes_enriched() {
        let (store, _dir) = test_store();
        store.insert_raw(&raw("old", 1_000)).unwrap();
        store.insert_raw(&raw("mid", 2_000)).unwrap();
        store.insert_raw(&raw("new", 3_000)).unwrap();

        store
            .persist_enriched(&[enriched(2, "mid", "m1")], false)
            .unwrap();

        let pending = store.select_unenriched(10).unwrap();
        let ids: Vec<&str> = pending.iter().map(|r| r.source_review_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn force_selection_ignores_enrichment() {
        let (store, _dir) = test_store();
        store.insert_raw(&raw("a", 1_000)).unwrap();
        store.insert_raw(&raw("b", 2_000)).unwrap();
        store
            .persist_enriched(&[enriched(1, "a", "m1")], false)
            .unwrap();

        let all = store.select_newest(10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].source_review_id, "b");

        let limited = store.select_newest(1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn normal_mode_skips_conflicts_without_error() {
        let (store, _dir) = test_store();
        store.insert_raw(&raw("r1", 1_000)).unwrap();

        let first = store
            .persist_enriched(&[enriched(1, "r1", "model-a")], false)
            .unwrap();
        assert_eq!(first, 1);

        // Re-run: skipped, not counted, original record untouched.
        let second = store
            .persist_enriched(&[enriched(1, "r1", "model-b")], false)
            .unwrap();
        assert_eq!(second, 0);

        let stored = store.get_enriched("google_play", "r1").unwrap().unwrap();
        assert_eq!(stored.model_version.as_deref(), Some("model-a"));
    }

    #[test]
    fn force_mode_replaces_all_enrichment_fields() {
        let (store, _dir) = test_store();
        store.insert_raw(&raw("r1", 1_000)).unwrap();
        store
            .persist_enriched(&[enriched(1, "r1", "model-a")], false)
            .unwrap();

        let mut replacement = enriched(1, "r1", "model-b");
        replacement.analyzed_at = 9_000;
        replacement.prompt_version = "v2".into();
        replacement.overall_sentiment = Sentiment::Negative;
        replacement.aspects = json!({"mentioned_aspects": [{"aspect": "delivery_time"}]});

        let written = store.persist_enriched(&[replacement], true).unwrap();
        assert_eq!(written, 1);

        let stored = store.get_enriched("google_play", "r1").unwrap().unwrap();
        assert_eq!(stored.model_version.as_deref(), Some("model-b"));
        assert_eq!(stored.prompt_version.as_deref(), Some("v2"));
        assert_eq!(stored.analyzed_at, 9_000);
        assert_eq!(stored.overall_sentiment, Sentiment::Negative);
        assert_eq!(
            stored.aspects["mentioned_aspects"][0]["aspect"],
            "delivery_time"
        );
        assert_eq!(store.count_enriched().unwrap(), 1);
    }

    #[test]
    fn batch_persist_counts_only_written_rows() {
        let (store, _dir) = test_store();
        store.insert_raw(&raw("a", 1_000)).unwrap();
        store.insert_raw(&raw("b", 2_000)).unwrap();
        store
            .persist_enriched(&[enriched(1, "a", "m")], false)
            .unwrap();

        let written = store
            .persist_enriched(&[enriched(1, "a", "m"), enriched(2, "b", "m")], false)
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.count_enriched().unwrap(), 2);
    }

    #[test]
    fn raw_payload_round_trips() {
        let (store, _dir) = test_store();
        store.insert_raw(&raw("r1", 1_000)).unwrap();
        let rows = store.select_newest(1).unwrap();
        assert_eq!(rows[0].raw_payload.as_ref().unwrap()["reviewId"], "r1");
    }
}
