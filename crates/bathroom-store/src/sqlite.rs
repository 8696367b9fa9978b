//! SQLite-backed restroom cache

use async_trait::async_trait;
use bathroom_core::models::{Toilet, ToiletId};
use bathroom_core::ports::ToiletCache;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Result;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS toilets (
        id TEXT PRIMARY KEY NOT NULL,
        data TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    )
"#;

/// Restroom cache stored in a single SQLite table
///
/// Each row holds the JSON snapshot of one record plus the time it was written.
#[derive(Debug, Clone)]
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// Open (creating if missing) a cache database file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new().max_connections(4).connect_with(options).await?;

        tracing::debug!(path = %path.as_ref().display(), "Opened cache database");
        Ok(Self { pool })
    }

    /// Private in-memory database, gone when the cache is dropped
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every connection to :memory: is its own database, so pin exactly one.
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(Option::<Duration>::None)
            .max_lifetime(Option::<Duration>::None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn try_init(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Upsert all records in one transaction
    pub async fn try_save(&self, toilets: &[Toilet]) -> Result<()> {
        let written_at = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        for toilet in toilets {
            let data = serde_json::to_string(toilet)?;
            sqlx::query("INSERT OR REPLACE INTO toilets (id, data, timestamp) VALUES (?, ?, ?)")
                .bind(toilet.id.as_str())
                .bind(data)
                .bind(written_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Every decodable record, ordered by id
    ///
    /// Rows whose snapshot no longer decodes are skipped.
    pub async fn try_load_all(&self) -> Result<Vec<Toilet>> {
        let rows = sqlx::query("SELECT id, data FROM toilets ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let toilets = rows
            .into_iter()
            .filter_map(|row| {
                let id: String = row.try_get("id").ok()?;
                let data: String = row.try_get("data").ok()?;
                match serde_json::from_str::<Toilet>(&data) {
                    Ok(toilet) => Some(toilet),
                    Err(e) => {
                        tracing::warn!(toilet_id = %id, error = %e, "Skipping undecodable cache row");
                        None
                    }
                }
            })
            .collect();

        Ok(toilets)
    }

    pub async fn try_remove(&self, ids: &[ToiletId]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM toilets WHERE id = ?")
                .bind(id.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Write time of a cached record, in epoch milliseconds
    pub async fn written_at(&self, id: &ToiletId) -> Result<Option<i64>> {
        let written_at: Option<i64> = sqlx::query_scalar("SELECT timestamp FROM toilets WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(written_at)
    }
}

#[async_trait]
impl ToiletCache for SqliteCache {
    async fn init(&self) {
        if let Err(e) = self.try_init().await {
            tracing::warn!(error = %e, "Failed to initialize cache schema");
        }
    }

    async fn save(&self, toilets: &[Toilet]) {
        if toilets.is_empty() {
            return;
        }
        if let Err(e) = self.try_save(toilets).await {
            tracing::warn!(count = toilets.len(), error = %e, "Failed to save to cache");
        }
    }

    async fn load_all(&self) -> Vec<Toilet> {
        self.try_load_all().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load cache; starting empty");
            Vec::new()
        })
    }

    async fn remove(&self, ids: &[ToiletId]) {
        if ids.is_empty() {
            return;
        }
        if let Err(e) = self.try_remove(ids).await {
            tracing::warn!(count = ids.len(), error = %e, "Failed to remove from cache");
        }
    }
}
