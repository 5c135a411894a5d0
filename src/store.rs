use crate::traits::ItemStore;
use crate::types::{Candidate, Item, PipelineError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bound on every store round trip: a hung connection fails that single
/// operation, not the whole cycle.
const STATEMENT_TIMEOUT: Duration = Duration::from_secs(10);

async fn bounded<T>(
    limit: Duration,
    op: &'static str,
    fut: impl Future<Output = std::result::Result<T, sqlx::Error>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(PipelineError::StoreTimeout { op }),
    }
}

/// PostgreSQL-backed item ledger.
///
/// Every mutation is a single statement, so the increment and the publish
/// flip are atomic per row without any in-process lock.
pub struct PgItemStore {
    db: PgPool,
}

impl PgItemStore {
    /// Connect with bounded retries and apply migrations. Exhausting the
    /// retries is the one fatal condition in the system: the caller should
    /// exit loudly rather than run without a ledger.
    pub async fn connect(database_url: &str, max_attempts: u32) -> Result<Self> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
                .connect(database_url)
                .await
            {
                Ok(db) => {
                    sqlx::migrate!("./migrations")
                        .run(&db)
                        .await
                        .map_err(|e| PipelineError::Database(e.into()))?;
                    info!("Connected to item store");
                    return Ok(Self { db });
                }
                Err(e) => {
                    if attempt >= max_attempts {
                        return Err(PipelineError::Database(e));
                    }
                    warn!(
                        "Store connection attempt {}/{} failed: {}",
                        attempt, max_attempts, e
                    );
                    tokio::time::sleep(Duration::from_secs(2 * attempt as u64)).await;
                }
            }
        }
    }
}

fn row_to_item(row: PgRow) -> Result<Item> {
    Ok(Item {
        guid: row.try_get("guid")?,
        title: row.try_get("title")?,
        link: row.try_get("link")?,
        source: row.try_get("source")?,
        published_at: row.try_get("published_at")?,
        score: row.try_get("score")?,
        published: row.try_get("published")?,
        first_seen: row.try_get("first_seen")?,
    })
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn exists(&self, guid: &str) -> Result<bool> {
        let row = bounded(
            STATEMENT_TIMEOUT,
            "exists",
            sqlx::query("SELECT 1 FROM items WHERE guid = $1")
                .bind(guid)
                .fetch_optional(&self.db),
        )
        .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, candidate: &Candidate) -> Result<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO items (guid, title, link, source, published_at, score, published, first_seen)
            VALUES ($1, $2, $3, $4, $5, 0, FALSE, $6)
            ON CONFLICT (guid) DO NOTHING
            "#,
        )
        .bind(&candidate.guid)
        .bind(&candidate.title)
        .bind(&candidate.link)
        .bind(&candidate.source)
        .bind(candidate.published_at)
        .bind(Utc::now())
        .execute(&self.db);
        let result = bounded(STATEMENT_TIMEOUT, "insert", query).await?;

        if result.rows_affected() == 0 {
            return Err(PipelineError::DuplicateKey {
                guid: candidate.guid.clone(),
            });
        }

        debug!("Inserted item {}", candidate.guid);
        Ok(())
    }

    async fn increment_score(&self, guid: &str) -> Result<()> {
        // The published guard freezes the score once the item is announced.
        let result = bounded(
            STATEMENT_TIMEOUT,
            "increment_score",
            sqlx::query("UPDATE items SET score = score + 1 WHERE guid = $1 AND published = FALSE")
                .bind(guid)
                .execute(&self.db),
        )
        .await?;

        if result.rows_affected() == 0 {
            debug!("No unpublished row to bump for {}", guid);
        } else {
            debug!("Bumped score for {}", guid);
        }
        Ok(())
    }

    async fn select_publishable(&self, threshold: i64, limit: i64) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT guid, title, link, source, published_at, score, published, first_seen
            FROM items
            WHERE published = FALSE AND score > $1
            ORDER BY score DESC, first_seen ASC
            LIMIT $2
            "#,
        )
        .bind(threshold)
        .bind(limit)
        .fetch_all(&self.db);
        let rows = bounded(STATEMENT_TIMEOUT, "select_publishable", rows).await?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn mark_published(&self, guid: &str) -> Result<()> {
        // Unconditional set keeps this idempotent: re-marking an already
        // published row still affects it, so zero rows means the guid is absent.
        let result = bounded(
            STATEMENT_TIMEOUT,
            "mark_published",
            sqlx::query("UPDATE items SET published = TRUE WHERE guid = $1")
                .bind(guid)
                .execute(&self.db),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(PipelineError::NotFound {
                guid: guid.to_string(),
            });
        }
        Ok(())
    }
}
