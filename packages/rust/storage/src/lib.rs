//! Turso Embedded / libSQL storage layer for extraction, critique, and
//! repurpose records.
//!
//! [`Storage`] is created once at startup and shared (`Arc<Storage>`) by every
//! pipeline run. Each unit of work opens its own connection from the
//! underlying [`Database`], so concurrent runs never contend on a single
//! connection handle.

mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use founderfuel_shared::{
    CritiqueResult, CritiqueScores, ExtractionRecord, FounderFuelError, PageContent, RecordId,
    RepurposeResult, RepurposedContent, Result,
};
use libsql::{Connection, Database, TransactionBehavior, params};
use tracing::{debug, info, instrument};

/// Milliseconds a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    db: Database,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FounderFuelError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let storage = Self { db };
        let conn = storage.connect().await?;
        // WAL lets history reads proceed while a pipeline run is writing.
        conn.query("PRAGMA journal_mode = WAL", params![])
            .await
            .map_err(storage_err)?;
        storage.run_migrations(&conn).await?;

        info!(path = %path.display(), "storage ready");
        Ok(storage)
    }

    /// Open a fresh connection with the busy timeout applied.
    async fn connect(&self) -> Result<Connection> {
        let conn = self.db.connect().map_err(storage_err)?;
        conn.query(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"), params![])
            .await
            .map_err(storage_err)?;
        Ok(conn)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self, conn: &Connection) -> Result<()> {
        let current_version = schema_version(conn).await?;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                conn.execute_batch(migration.sql).await.map_err(|e| {
                    FounderFuelError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Persist one extraction and return the stored record.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn insert_extraction(&self, url: &str, page: &PageContent) -> Result<ExtractionRecord> {
        let record = extraction_record(url, page);
        let conn = self.connect().await?;
        write_extraction(&conn, &record).await?;

        debug!(id = %record.id, "extraction stored");
        Ok(record)
    }

    /// Persist a critique together with the extraction it was computed from.
    ///
    /// Both rows are written in one transaction: either both exist afterwards
    /// or neither does.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn insert_critique(
        &self,
        url: &str,
        page: &PageContent,
        scores: &CritiqueScores,
    ) -> Result<CritiqueResult> {
        let extraction = extraction_record(url, page);
        let critique = CritiqueResult {
            id: RecordId::new(),
            url: url.to_string(),
            headline_score: scores.headline_score,
            value_score: scores.value_score,
            cta_score: scores.cta_score,
            trust_score: scores.trust_score,
            overall_score: scores.overall_score,
            feedback: scores.feedback.clone(),
            analyzed_at: now(),
        };

        let conn = self.connect().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(storage_err)?;

        write_extraction(&tx, &extraction).await?;
        tx.execute(
            "INSERT INTO analysis_results
               (id, url, headline_score, value_score, cta_score, trust_score,
                overall_score, feedback, analyzed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                critique.id.to_string(),
                critique.url.as_str(),
                i64::from(critique.headline_score),
                i64::from(critique.value_score),
                i64::from(critique.cta_score),
                i64::from(critique.trust_score),
                i64::from(critique.overall_score),
                critique.feedback.as_str(),
                timestamp(&critique.analyzed_at),
            ],
        )
        .await
        .map_err(storage_err)?;
        tx.commit().await.map_err(storage_err)?;

        debug!(id = %critique.id, extraction_id = %extraction.id, "critique stored");
        Ok(critique)
    }

    /// Persist repurposed copy together with the extraction it was built from.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn insert_repurpose(
        &self,
        url: &str,
        page: &PageContent,
        content: &RepurposedContent,
    ) -> Result<RepurposeResult> {
        let extraction = extraction_record(url, page);
        let result = RepurposeResult {
            id: RecordId::new(),
            url: url.to_string(),
            title: page.title.clone(),
            twitter_thread: content.twitter_thread.clone(),
            linkedin_post: content.linkedin_post.clone(),
            newsletter: content.newsletter.clone(),
            created_at: now(),
        };

        let conn = self.connect().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(storage_err)?;

        write_extraction(&tx, &extraction).await?;
        tx.execute(
            "INSERT INTO repurpose_results
               (id, url, title, twitter_thread, linkedin_post, newsletter, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                result.id.to_string(),
                result.url.as_str(),
                result.title.as_str(),
                result.twitter_thread.as_str(),
                result.linkedin_post.as_str(),
                result.newsletter.as_str(),
                timestamp(&result.created_at),
            ],
        )
        .await
        .map_err(storage_err)?;
        tx.commit().await.map_err(storage_err)?;

        debug!(id = %result.id, extraction_id = %extraction.id, "repurpose stored");
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Most recent extractions first, at most `limit` rows.
    pub async fn list_extractions(&self, limit: u32) -> Result<Vec<ExtractionRecord>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, url, title, description, body_text, scraped_at
                 FROM scrape_results
                 ORDER BY scraped_at DESC, id DESC
                 LIMIT ?1",
                params![i64::from(limit)],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_extraction(&row)?);
        }
        Ok(results)
    }

    /// Most recent critiques first, at most `limit` rows.
    pub async fn list_critiques(&self, limit: u32) -> Result<Vec<CritiqueResult>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, url, headline_score, value_score, cta_score, trust_score,
                        overall_score, feedback, analyzed_at
                 FROM analysis_results
                 ORDER BY analyzed_at DESC, id DESC
                 LIMIT ?1",
                params![i64::from(limit)],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_critique(&row)?);
        }
        Ok(results)
    }

    /// Most recent repurpose results first, at most `limit` rows.
    pub async fn list_repurposes(&self, limit: u32) -> Result<Vec<RepurposeResult>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, url, title, twitter_thread, linkedin_post, newsletter, created_at
                 FROM repurpose_results
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1",
                params![i64::from(limit)],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_repurpose(&row)?);
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn storage_err(e: libsql::Error) -> FounderFuelError {
    FounderFuelError::Storage(e.to_string())
}

/// Current time at the precision stored on disk, so returned records compare
/// equal to the ones read back later.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so lexical order equals chronological order.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FounderFuelError::Storage(format!("invalid date {s:?}: {e}")))
}

fn extraction_record(url: &str, page: &PageContent) -> ExtractionRecord {
    ExtractionRecord {
        id: RecordId::new(),
        url: url.to_string(),
        title: page.title.clone(),
        description: page.description.clone(),
        body_text: page.body_text.clone(),
        scraped_at: now(),
    }
}

async fn write_extraction(conn: &Connection, record: &ExtractionRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO scrape_results (id, url, title, description, body_text, scraped_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id.to_string(),
            record.url.as_str(),
            record.title.as_str(),
            record.description.as_str(),
            record.body_text.as_str(),
            timestamp(&record.scraped_at),
        ],
    )
    .await
    .map_err(storage_err)?;
    Ok(())
}

/// Get the current schema version, or 0 if no migrations have been applied.
///
/// Only a missing `schema_migrations` table means version 0; any other query
/// failure is returned.
async fn schema_version(conn: &Connection) -> Result<u32> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
            params![],
        )
        .await
        .map_err(storage_err)?;
    let exists = match rows.next().await.map_err(storage_err)? {
        Some(row) => row.get::<i64>(0).map_err(storage_err)? > 0,
        None => false,
    };
    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            params![],
        )
        .await
        .map_err(storage_err)?;
    match rows.next().await.map_err(storage_err)? {
        Some(row) => row.get::<u32>(0).map_err(storage_err),
        None => Ok(0),
    }
}

fn get_string(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx).map_err(storage_err)
}

fn get_id(row: &libsql::Row, idx: i32) -> Result<RecordId> {
    let raw = get_string(row, idx)?;
    raw.parse()
        .map_err(|e| FounderFuelError::Storage(format!("invalid record id {raw:?}: {e}")))
}

fn get_score(row: &libsql::Row, idx: i32) -> Result<u8> {
    let raw = row.get::<i64>(idx).map_err(storage_err)?;
    u8::try_from(raw).map_err(|_| FounderFuelError::Storage(format!("score out of range: {raw}")))
}

fn row_to_extraction(row: &libsql::Row) -> Result<ExtractionRecord> {
    Ok(ExtractionRecord {
        id: get_id(row, 0)?,
        url: get_string(row, 1)?,
        title: get_string(row, 2)?,
        description: get_string(row, 3)?,
        body_text: get_string(row, 4)?,
        scraped_at: parse_timestamp(&get_string(row, 5)?)?,
    })
}

fn row_to_critique(row: &libsql::Row) -> Result<CritiqueResult> {
    Ok(CritiqueResult {
        id: get_id(row, 0)?,
        url: get_string(row, 1)?,
        headline_score: get_score(row, 2)?,
        value_score: get_score(row, 3)?,
        cta_score: get_score(row, 4)?,
        trust_score: get_score(row, 5)?,
        overall_score: get_score(row, 6)?,
        feedback: get_string(row, 7)?,
        analyzed_at: parse_timestamp(&get_string(row, 8)?)?,
    })
}

fn row_to_repurpose(row: &libsql::Row) -> Result<RepurposeResult> {
    Ok(RepurposeResult {
        id: get_id(row, 0)?,
        url: get_string(row, 1)?,
        title: get_string(row, 2)?,
        twitter_thread: get_string(row, 3)?,
        linkedin_post: get_string(row, 4)?,
        newsletter: get_string(row, 5)?,
        created_at: parse_timestamp(&get_string(row, 6)?)?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("ff_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn page(title: &str) -> PageContent {
        PageContent {
            title: title.into(),
            description: "No description found".into(),
            body_text: format!("{title} body"),
        }
    }

    fn scores() -> CritiqueScores {
        CritiqueScores {
            headline_score: 8,
            value_score: 6,
            cta_score: 7,
            trust_score: 5,
            overall_score: 7,
            feedback: "Clear headline, weak proof.".into(),
        }
    }

    fn copy() -> RepurposedContent {
        RepurposedContent {
            twitter_thread: "1/ Ship it".into(),
            linkedin_post: "Excited to share".into(),
            newsletter: "This week".into(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let conn = storage.connect().await.unwrap();
        assert_eq!(schema_version(&conn).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("ff_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        s1.insert_extraction("https://example.com", &page("Kept"))
            .await
            .unwrap();
        drop(s1);

        let s2 = Storage::open(&tmp).await.expect("second open");
        let conn = s2.connect().await.unwrap();
        assert_eq!(schema_version(&conn).await.unwrap(), 2);
        assert_eq!(s2.list_extractions(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fresh_database_is_version_zero() {
        let tmp = std::env::temp_dir().join(format!("ff_test_{}.db", Uuid::now_v7()));
        let db = libsql::Builder::new_local(&tmp).build().await.unwrap();
        let conn = db.connect().unwrap();
        assert_eq!(schema_version(&conn).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreadable_migration_table_fails_open() {
        let tmp = std::env::temp_dir().join(format!("ff_test_{}.db", Uuid::now_v7()));
        {
            let db = libsql::Builder::new_local(&tmp).build().await.unwrap();
            let conn = db.connect().unwrap();
            conn.execute_batch("CREATE TABLE schema_migrations (label TEXT);")
                .await
                .unwrap();
            assert!(schema_version(&conn).await.is_err());
        }

        let err = Storage::open(&tmp).await.err().expect("open should fail");
        assert!(matches!(err, FounderFuelError::Storage(_)));
        assert!(!err.to_string().contains("migration v1"));
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("ff_nested_{}", Uuid::now_v7()));
        let path = dir.join("deeper").join("founderfuel.db");
        Storage::open(&path).await.expect("open nested");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn extraction_roundtrip() {
        let storage = test_storage().await;
        let stored = storage
            .insert_extraction("https://example.com/a", &page("Alpha"))
            .await
            .expect("insert");

        let listed = storage.list_extractions(20).await.expect("list");
        assert_eq!(listed, vec![stored]);
        assert_eq!(listed[0].body_text, "Alpha body");
    }

    #[tokio::test]
    async fn extractions_are_newest_first_and_limited() {
        let storage = test_storage().await;
        for title in ["one", "two", "three"] {
            storage
                .insert_extraction("https://example.com", &page(title))
                .await
                .unwrap();
        }

        let all = storage.list_extractions(20).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two", "one"]);

        let limited = storage.list_extractions(2).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].title, "three");
    }

    #[tokio::test]
    async fn repeated_url_creates_independent_records() {
        let storage = test_storage().await;
        let a = storage
            .insert_extraction("https://example.com", &page("same"))
            .await
            .unwrap();
        let b = storage
            .insert_extraction("https://example.com", &page("same"))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(storage.list_extractions(20).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn critique_writes_extraction_alongside() {
        let storage = test_storage().await;
        let critique = storage
            .insert_critique("https://example.com/landing", &page("Landing"), &scores())
            .await
            .expect("insert critique");

        assert_eq!(critique.url, "https://example.com/landing");
        assert_eq!(critique.overall_score, 7);

        let critiques = storage.list_critiques(20).await.unwrap();
        assert_eq!(critiques, vec![critique]);

        let extractions = storage.list_extractions(20).await.unwrap();
        assert_eq!(extractions.len(), 1);
        assert_eq!(extractions[0].title, "Landing");
    }

    #[tokio::test]
    async fn repurpose_writes_extraction_alongside() {
        let storage = test_storage().await;
        let result = storage
            .insert_repurpose("https://example.com/post", &page("Post"), &copy())
            .await
            .expect("insert repurpose");

        assert_eq!(result.title, "Post");
        assert_eq!(storage.list_repurposes(20).await.unwrap(), vec![result]);
        assert_eq!(storage.list_extractions(20).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_critique_leaves_no_extraction() {
        let storage = test_storage().await;
        let bad = CritiqueScores {
            headline_score: 11,
            ..scores()
        };

        let err = storage
            .insert_critique("https://example.com", &page("Rolled back"), &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, FounderFuelError::Storage(_)));
        assert!(storage.list_extractions(20).await.unwrap().is_empty());
        assert!(storage.list_critiques(20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_history_is_empty() {
        let storage = test_storage().await;
        assert!(storage.list_extractions(20).await.unwrap().is_empty());
        assert!(storage.list_critiques(20).await.unwrap().is_empty());
        assert!(storage.list_repurposes(20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_writers_share_one_handle() {
        let storage = Arc::new(test_storage().await);

        let mut handles = Vec::new();
        for i in 0..8 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                storage
                    .insert_critique(&format!("https://example.com/{i}"), &page("p"), &scores())
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("insert");
        }

        assert_eq!(storage.list_critiques(100).await.unwrap().len(), 8);
        assert_eq!(storage.list_extractions(100).await.unwrap().len(), 8);
    }

    #[test]
    fn timestamps_are_fixed_width() {
        let a = timestamp(&DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap().into());
        let b = timestamp(&DateTime::parse_from_rfc3339("2025-01-01T00:00:00.5Z").unwrap().into());
        assert_eq!(a, "2025-01-01T00:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }
}
