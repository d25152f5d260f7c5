//! `ProgressStore` trait: the single async interface the wizard persists
//! through. Values are opaque JSON blobs; the store never interprets them.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Backend-agnostic key/value persistence for wizard progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the blob stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or replace the blob under `key`.
    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), DatabaseError>;

    /// Remove `key`. Returns whether anything was deleted.
    async fn delete(&self, key: &str) -> Result<bool, DatabaseError>;
}
