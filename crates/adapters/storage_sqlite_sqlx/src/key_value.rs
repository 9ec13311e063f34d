//! `SQLite` implementation of [`KeyValueStore`].

use sqlx::SqlitePool;

use bizhub_app::ports::KeyValueStore;
use bizhub_domain::error::BizHubError;

use crate::error::StorageError;

const SELECT: &str = "SELECT value FROM kv_store WHERE key = ?";
const UPSERT: &str = r"
    INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
    ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
";

/// `SQLite`-backed blob storage, one row per key.
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BizHubError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BizHubError> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
