pub mod blob;
pub mod file_store;
pub mod stats;
pub mod subscriptions;


pub use blob::{BlobStore, MemoryBlobStore};
pub use file_store::FileBlobStore;
pub use stats::StatsCounter;
pub use subscriptions::SubscriptionStore;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};
use watcher_core::StorageError;

/// SQLite-backed blob storage.
pub struct Database {
    connection_string: String,
    pool: Option<SqlitePool>,
}

impl Database {
    pub fn new(connection_string: String) -> Self {
        Self {
            connection_string,
            pool: None,
        }
    }

    pub async fn connect(&mut self) -> Result<(), StorageError> {
        let options =
            SqliteConnectOptions::from_str(&self.connection_string)?.create_if_missing(true);

        // One writer keeps saves strictly ordered.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        info!("Connected to {}", self.connection_string);
        self.pool = Some(pool);
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(self.pool()?)
        .await?;
        Ok(())
    }

    fn pool(&self) -> Result<&SqlitePool, StorageError> {
        self.pool.as_ref().ok_or_else(|| StorageError::Backend {
            message: "database not connected".to_string(),
        })
    }
}

#[async_trait]
impl BlobStore for Database {
    async fn save_blob(&self, key: &str, value: &str) -> Result<(), StorageError> {
        blob::validate_key(key)?;
        sqlx::query(
            "INSERT INTO blobs (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(self.pool()?)
        .await?;

        debug!("Saved blob {}", key);
        Ok(())
    }

    async fn load_blob(&self, key: &str) -> Result<Option<String>, StorageError> {
        blob::validate_key(key)?;
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM blobs WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(value)
    }
}
