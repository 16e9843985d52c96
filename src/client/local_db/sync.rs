//! # Cache Entry Operations
//!
//! Reads and writes of single entries in either key space. Writes are
//! upserts stamped with `updated_at`.

use crate::client::local_db::{KeySpace, LocalDatabase};
use crate::shared::error::Result;
use sqlx::Row;

impl LocalDatabase {
    /// Insert or replace an entry
    pub async fn put_entry(&self, space: KeySpace, key: &str, value: &str) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (key, value, updated_at) VALUES (?, ?, ?)",
            space.table()
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(value)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Read an entry
    pub async fn get_entry(&self, space: KeySpace, key: &str) -> Result<Option<String>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?", space.table());
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    /// Delete every entry of both key spaces
    pub async fn clear_entries(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for space in [KeySpace::Data, KeySpace::Markers] {
            let sql = format!("DELETE FROM {}", space.table());
            sqlx::query(&sql).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
