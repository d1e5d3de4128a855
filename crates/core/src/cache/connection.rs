//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! (WAL mode, foreign keys for partition cascades), and running migrations.
//! It also wires [`CacheDb`] into the [`CacheStorage`] abstraction.

use super::hash::RequestKey;
use super::migrations;
use super::storage::{CacheStorage, EntrySummary};
use crate::Error;
use crate::http::Response;
use async_trait::async_trait;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Persistent partition store.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.create_partition(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.partition_exists(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.list_partitions().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.drop_partition(name).await
    }

    async fn match_entry(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.get_entry(name, key).await
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.find_entry(key).await
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.upsert_entries(name, vec![(key.clone(), response.clone())]).await
    }

    async fn put_all(&self, name: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.upsert_entries(name, entries.to_vec()).await
    }

    async fn entries(&self, name: &str) -> Result<Vec<EntrySummary>, Error> {
        self.list_entries(name).await
    }
}
