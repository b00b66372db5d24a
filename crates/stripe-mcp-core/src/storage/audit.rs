use crate::audit::{AuditEntry, AuditSink};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;

/// Durable copy of the audit log, one row per recorded operation.
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::default()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await?;
        let store = Self { pool };
        store.initialize_table().await?;
        Ok(store)
    }

    async fn initialize_table(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
               CREATE TABLE IF NOT EXISTS audit_entries (
                   id INTEGER PRIMARY KEY AUTOINCREMENT,
                   timestamp TEXT NOT NULL,
                   operation TEXT NOT NULL,
                   parameters TEXT NOT NULL
               )
               "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_entry(&self, entry: &AuditEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
               INSERT INTO audit_entries (timestamp, operation, parameters)
               VALUES (?, ?, ?)
               "#,
        )
        .bind(entry.timestamp_iso())
        .bind(&entry.operation)
        .bind(entry.parameters.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

#[async_trait]
impl AuditSink for SqliteAuditStore {
    async fn record(
        &self,
        entry: &AuditEntry,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.insert_entry(entry).await?;
        Ok(())
    }
}
