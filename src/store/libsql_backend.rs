//! libSQL backend: async `ProgressStore` implementation.
//!
//! Supports local file and in-memory databases. Blobs live in the
//! `wizard_state` table as JSON text.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::ProgressStore;

/// Progress store backed by a libSQL database.
///
/// One connection serves every call. The `Database` is held for as long as
/// the connection is.
pub struct LibSqlStore {
    _db: LibSqlDatabase,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a database file, creating missing parent directories.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::Pool(format!("{}: {e}", parent.display())))?;
        }
        let store = Self::open(libsql::Builder::new_local(path).build().await).await?;
        info!(path = %path.display(), "Progress database opened");
        Ok(store)
    }

    /// Private in-memory database, gone when the store is dropped.
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        Self::open(libsql::Builder::new_local(":memory:").build().await).await
    }

    async fn open(built: libsql::Result<LibSqlDatabase>) -> Result<Self, DatabaseError> {
        let db = built.map_err(|e| DatabaseError::Pool(format!("open: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("connect: {e}")))?;
        let version = migrations::migrate(&conn).await?;
        debug!(schema_version = version, "Progress schema ready");
        Ok(Self { _db: db, conn })
    }

    /// When `key` was last written.
    pub async fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT updated_at FROM wizard_state WHERE key = ?1",
                params![key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("updated_at: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("updated_at: {e}")))?;
                Ok(parse_timestamp(&raw))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("updated_at: {e}"))),
        }
    }
}

/// `updated_at` is written as RFC 3339; rows touched by hand in the sqlite
/// shell usually carry `datetime('now')` instead.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|n| n.and_utc())
        })
        .ok()
}

#[async_trait]
impl ProgressStore for LibSqlStore {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, DatabaseError> {
        let mut rows = self
            .conn
            .query("SELECT value FROM wizard_state WHERE key = ?1", params![key])
            .await
            .map_err(|e| DatabaseError::Query(format!("load: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("load: {e}")))?;
                let value = serde_json::from_str(&raw)
                    .map_err(|e| DatabaseError::Serialization(format!("load {key}: {e}")))?;
                debug!(key, "Loaded progress blob");
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("load: {e}"))),
        }
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let raw = serde_json::to_string(value)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO wizard_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, raw, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save: {e}")))?;
        debug!(key, "Saved progress blob");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn
            .execute("DELETE FROM wizard_state WHERE key = ?1", params![key])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete: {e}")))?;
        Ok(count > 0)
    }
}
