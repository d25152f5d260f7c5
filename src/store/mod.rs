//! Persistence layer: key/value storage for wizard progress and profiles.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DatabaseError;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use traits::ProgressStore;

/// `<prefix>:<flow_id>:session`
pub fn session_key(prefix: &str, flow_id: &str) -> String {
    format!("{prefix}:{flow_id}:session")
}

/// `<prefix>:<flow_id>:profile`
pub fn profile_key(prefix: &str, flow_id: &str) -> String {
    format!("{prefix}:{flow_id}:profile")
}

/// Load and deserialize a typed value.
pub async fn load_as<T: DeserializeOwned>(
    store: &dyn ProgressStore,
    key: &str,
) -> Result<Option<T>, DatabaseError> {
    match store.load(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| DatabaseError::Serialization(format!("{key}: {e}"))),
        None => Ok(None),
    }
}

/// Serialize and save a typed value.
pub async fn save_as<T: Serialize>(
    store: &dyn ProgressStore,
    key: &str,
    value: &T,
) -> Result<(), DatabaseError> {
    let value =
        serde_json::to_value(value).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
    store.save(key, &value).await
}
