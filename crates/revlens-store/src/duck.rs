//! DuckDB storage for analysed reviews.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{Connection, params};
use revlens_core::{KeyPoints, ReviewDraft, ReviewError, ReviewRecord, ReviewStore, Sentiment};
use tracing::{debug, info};

use crate::{StoreError, now_micros};

const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS reviews_id_seq START 1;
CREATE TABLE IF NOT EXISTS reviews (
    id               BIGINT PRIMARY KEY DEFAULT nextval('reviews_id_seq'),
    review_text      VARCHAR NOT NULL,
    sentiment        VARCHAR NOT NULL CHECK (sentiment IN ('positive', 'negative', 'neutral')),
    confidence_score DOUBLE  NOT NULL CHECK (confidence_score BETWEEN 0 AND 1),
    key_points       VARCHAR NOT NULL,
    created_at       TIMESTAMP NOT NULL
);
";

const INSERT_REVIEW: &str = "
INSERT INTO reviews (review_text, sentiment, confidence_score, key_points, created_at)
VALUES (?, ?, ?, ?, CAST(? AS TIMESTAMP))
RETURNING id";

const SELECT_PAGE: &str = "
SELECT id, review_text, sentiment, confidence_score, key_points, epoch_us(created_at)
FROM reviews
ORDER BY created_at DESC, id DESC
LIMIT ? OFFSET ?";

/// DuckDB-backed [`ReviewStore`].
///
/// One `reviews` table with a sequence-backed surrogate key. Inserts run in a
/// transaction so a rejected row is never visible to `count`/`list`.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage that survives across process restarts.
///
/// DuckDB calls block, so each operation runs on tokio's blocking pool with the
/// connection behind a mutex.
#[derive(Clone)]
pub struct DuckStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self::init(conn)?;
        info!(path = %path.display(), "opened review store");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut *guard)
        })
        .await?
    }

    async fn insert(
        &self,
        draft: ReviewDraft,
        created_at: DateTime<Utc>,
    ) -> Result<ReviewRecord, StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let id: i64 = tx.query_row(
                INSERT_REVIEW,
                params![
                    draft.review_text,
                    draft.sentiment.as_str(),
                    draft.confidence_score,
                    draft.key_points.to_json(),
                    created_at.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
                ],
                |row| row.get(0),
            )?;
            tx.commit()?;
            debug!(id, "inserted review");
            Ok(draft.into_record(id, created_at))
        })
        .await
    }

    /// Number of rows in the `reviews` table.
    pub async fn review_count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| count_rows(conn)).await
    }

    /// A window of reviews, newest first, ties broken by id descending.
    pub async fn review_page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        self.with_conn(move |conn| select_page(conn, offset, limit)).await
    }

    /// Row count and window read inside one transaction.
    pub async fn review_snapshot(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(u64, Vec<ReviewRecord>), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let total = count_rows(&tx)?;
            let reviews = select_page(&tx, offset, limit)?;
            tx.commit()?;
            Ok((total, reviews))
        })
        .await
    }
}

fn count_rows(conn: &Connection) -> Result<u64, StoreError> {
    let count: i64 = conn.query_row("SELECT count(*) FROM reviews", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

fn select_page(conn: &Connection, offset: u64, limit: u32) -> Result<Vec<ReviewRecord>, StoreError> {
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(SELECT_PAGE)?;
    let rows = stmt.query_map(params![i64::from(limit), offset], |row| {
        Ok(RawReview {
            id: row.get(0)?,
            review_text: row.get(1)?,
            sentiment: row.get(2)?,
            confidence_score: row.get(3)?,
            key_points: row.get(4)?,
            created_at_us: row.get(5)?,
        })
    })?;

    let mut reviews = Vec::new();
    for row in rows {
        reviews.push(row?.into_record()?);
    }
    Ok(reviews)
}

#[async_trait]
impl ReviewStore for DuckStore {
    async fn create(&self, draft: ReviewDraft) -> Result<ReviewRecord, ReviewError> {
        Ok(self.insert(draft, now_micros()).await?)
    }

    async fn count(&self) -> Result<u64, ReviewError> {
        Ok(self.review_count().await?)
    }

    async fn list(&self, offset: u64, limit: u32) -> Result<Vec<ReviewRecord>, ReviewError> {
        Ok(self.review_page(offset, limit).await?)
    }

    async fn page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(u64, Vec<ReviewRecord>), ReviewError> {
        Ok(self.review_snapshot(offset, limit).await?)
    }
}

/// A `reviews` row before its text columns are decoded.
struct RawReview {
    id: i64,
    review_text: String,
    sentiment: String,
    confidence_score: f64,
    key_points: String,
    created_at_us: i64,
}

impl RawReview {
    fn into_record(self) -> Result<ReviewRecord, StoreError> {
        let id = self.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        let sentiment = Sentiment::parse(&self.sentiment)
            .ok_or_else(|| corrupt(format!("unknown sentiment '{}'", self.sentiment)))?;
        let key_points = KeyPoints::from_json(&self.key_points).map_err(|e| corrupt(e.to_string()))?;
        let created_at = DateTime::from_timestamp_micros(self.created_at_us)
            .ok_or_else(|| corrupt(format!("timestamp {} out of range", self.created_at_us)))?;

        Ok(ReviewRecord {
            id,
            review_text: self.review_text,
            sentiment,
            confidence_score: self.confidence_score,
            key_points,
            created_at,
        })
    }
}
