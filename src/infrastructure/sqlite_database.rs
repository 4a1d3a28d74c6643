use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::core::PageId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::snapshot::CacheSnapshot;
use crate::infrastructure::traits::SnapshotBackend;

/// SQLite implementation of the persistent snapshot store
pub struct SqliteSnapshotBackend {
    pool: SqlitePool,
}

impl SqliteSnapshotBackend {
    /// Open (creating if needed) a database at a `sqlite:` URL
    pub async fn connect(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Configuration(format!("Invalid cache URL {}: {}", url, e)))?
            .create_if_missing(true);

        // A single long-lived connection keeps writes in issue order and keeps
        // `sqlite::memory:` databases alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to open snapshot cache {}: {}", url, e)))?;

        let backend = Self { pool };
        backend.initialize().await?;
        info!("Snapshot cache opened at {}", url);
        Ok(backend)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Create the snapshot table
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS page_snapshots (
                page_id TEXT PRIMARY KEY,
                snapshot TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to create snapshots table: {}", e)))?;

        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM page_snapshots")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl SnapshotBackend for SqliteSnapshotBackend {
    async fn load(&self, page_id: &PageId) -> AppResult<Option<CacheSnapshot>> {
        let row = sqlx::query("SELECT snapshot FROM page_snapshots WHERE page_id = ?")
            .bind(page_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to load snapshot {}: {}", page_id, e)))?;

        match row {
            Some(row) => {
                let text: String = row.get("snapshot");
                Ok(Some(serde_json::from_str(&text)?))
            }
            None => Ok(None),
        }
    }

    async fn store(&self, page_id: &PageId, snapshot: &CacheSnapshot) -> AppResult<()> {
        let text = serde_json::to_string(snapshot)?;
        sqlx::query(
            r#"
            INSERT INTO page_snapshots (page_id, snapshot, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(page_id) DO UPDATE SET snapshot = excluded.snapshot, updated_at = excluded.updated_at
            "#,
        )
        .bind(page_id.as_str())
        .bind(text)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to store snapshot {}: {}", page_id, e)))?;

        debug!("Stored snapshot for page {}", page_id);
        Ok(())
    }

    async fn remove(&self, page_id: &PageId) -> AppResult<()> {
        sqlx::query("DELETE FROM page_snapshots WHERE page_id = ?")
            .bind(page_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to remove snapshot {}: {}", page_id, e)))?;
        Ok(())
    }
}
