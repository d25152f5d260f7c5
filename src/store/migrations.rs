//! Schema versions for the wizard progress database.
//!
//! `migrate` brings a connection up to `SCHEMA.last()`; each pending version
//! is applied together with its bookkeeping row inside one transaction.

use libsql::Connection;

use crate::error::DatabaseError;

/// (version, name, sql). Versions are strictly increasing.
const SCHEMA: &[(i64, &str, &str)] = &[
    (
        1,
        "wizard_state",
        "CREATE TABLE IF NOT EXISTS wizard_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
    ),
    (
        2,
        "wizard_state_updated_index",
        "CREATE INDEX IF NOT EXISTS idx_wizard_state_updated_at ON wizard_state(updated_at);",
    ),
];

pub fn latest_version() -> i64 {
    SCHEMA.last().map_or(0, |(version, _, _)| *version)
}

/// Apply every schema version newer than the one recorded in `_migrations`.
pub async fn migrate(conn: &Connection) -> Result<i64, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("_migrations: {e}")))?;

    let applied = applied_version(conn).await?;
    let mut version = applied;
    for &(next, name, sql) in SCHEMA.iter().filter(|(v, _, _)| *v > applied) {
        tracing::info!(version = next, name, "Applying schema migration");
        let batch = format!(
            "BEGIN;\n{sql}\nINSERT INTO _migrations (version, name) VALUES ({next}, '{name}');\nCOMMIT;"
        );
        if let Err(e) = conn.execute_batch(&batch).await {
            // A failed statement leaves the transaction open.
            let _ = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::Migration(format!("V{next} {name}: {e}")));
        }
        version = next;
    }
    Ok(version)
}

async fn applied_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    match rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?
    {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(e.to_string())),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_conn() -> Connection {
        libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap()
            .connect()
            .unwrap()
    }

    async fn count(conn: &Connection, sql: &str) -> i64 {
        let mut rows = conn.query(sql, ()).await.unwrap();
        rows.next().await.unwrap().unwrap().get(0).unwrap()
    }

    #[tokio::test]
    async fn fresh_database_reaches_latest() {
        let conn = memory_conn().await;
        assert_eq!(migrate(&conn).await.unwrap(), latest_version());
        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='wizard_state'"
            )
            .await,
            1
        );
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM _migrations").await,
            SCHEMA.len() as i64
        );
    }

    #[tokio::test]
    async fn rerun_applies_nothing() {
        let conn = memory_conn().await;
        migrate(&conn).await.unwrap();
        assert_eq!(migrate(&conn).await.unwrap(), latest_version());
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM _migrations").await,
            SCHEMA.len() as i64
        );
    }

    #[tokio::test]
    async fn partially_migrated_database_catches_up() {
        let conn = memory_conn().await;
        conn.execute_batch(
            "CREATE TABLE _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE TABLE wizard_state (key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at TEXT NOT NULL);
            INSERT INTO _migrations (version, name) VALUES (1, 'wizard_state');",
        )
        .await
        .unwrap();

        assert_eq!(migrate(&conn).await.unwrap(), latest_version());
        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_wizard_state_updated_at'"
            )
            .await,
            1
        );
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM _migrations").await,
            SCHEMA.len() as i64
        );
    }

    #[test]
    fn versions_increase() {
        assert!(SCHEMA.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
