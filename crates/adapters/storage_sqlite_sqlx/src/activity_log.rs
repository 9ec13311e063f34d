//! `SQLite` implementation of [`ActivityLog`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use bizhub_app::ports::{ActivityEntry, ActivityLog};
use bizhub_domain::error::BizHubError;

use crate::error::StorageError;

struct Wrapper(ActivityEntry);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let message: String = row.try_get("message")?;
        let category: String = row.try_get("category")?;
        let source: String = row.try_get("source")?;
        let data_json: String = row.try_get("data")?;
        let timestamp_str: String = row.try_get("timestamp")?;

        let data: serde_json::Value =
            serde_json::from_str(&data_json).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(ActivityEntry {
            message,
            category,
            source,
            data,
            timestamp,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO activity_log (message, category, source, data, timestamp)
    VALUES (?, ?, ?, ?, ?)
";

const SELECT_RECENT: &str = "SELECT * FROM activity_log ORDER BY id DESC LIMIT ?";

/// `SQLite`-backed activity journal.
pub struct SqliteActivityLog {
    pool: SqlitePool,
}

impl SqliteActivityLog {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The most recent entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn recent(&self, limit: usize) -> Result<Vec<ActivityEntry>, BizHubError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

impl ActivityLog for SqliteActivityLog {
    async fn append(&self, entry: ActivityEntry) -> Result<(), BizHubError> {
        let data_json = serde_json::to_string(&entry.data).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(&entry.message)
            .bind(&entry.category)
            .bind(&entry.source)
            .bind(&data_json)
            .bind(entry.timestamp.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
