//! Schema for the partition store.
//!
//! `partitions` holds one row per named cache, in creation order (`rowid`).
//! `entries` holds the stored responses and hangs off `partitions` with
//! `ON DELETE CASCADE`, so dropping a partition drops its entries. Applied
//! steps are recorded in `_migrations`.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// Schema steps, oldest first.
const STEPS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_partitions.sql"))];

fn schema_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
    )?;
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
    Ok(version)
}

/// Bring the schema up to date. Each step runs in its own transaction.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the step whose SQL was rejected.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current = schema_version(conn)?;

        for (version, sql) in STEPS.iter().filter(|(v, _)| *v > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("step {version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version, "partition schema step applied");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
