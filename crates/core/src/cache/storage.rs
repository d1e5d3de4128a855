//! Storage abstraction for named cache partitions.
//!
//! The controller never touches a backend directly; it is handed an
//! `Arc<dyn CacheStorage>` so tests can swap in [`MemoryStorage`].
//!
//! [`MemoryStorage`]: super::MemoryStorage

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::hash::RequestKey;
use crate::Error;
use crate::http::Response;

/// Summary of a stored entry, without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntrySummary {
    pub hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
}

/// A set of named partitions mapping request identities to responses.
///
/// Per-key atomicity is the backend's job. Writers to the same key are
/// last-write-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a partition, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Whether a partition exists.
    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// All partition names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a partition and everything in it.
    ///
    /// Returns false if no such partition existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look up a key in one partition. A missing partition is a miss.
    async fn match_entry(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Look up a key across all partitions in creation order.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Store a response, replacing any previous entry for the key.
    ///
    /// Only `open` creates partitions. Writing into a partition that does not
    /// exist (never opened, or deleted since) fails with `Error::Storage`, so a
    /// late write cannot bring back a partition that activation removed.
    async fn put(&self, name: &str, key: &RequestKey, response: &Response) -> Result<(), Error>;

    /// Store several responses as one unit: either all land or none do.
    ///
    /// Same partition rule as [`CacheStorage::put`].
    async fn put_all(&self, name: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error>;

    /// Entries held by a partition, oldest first.
    async fn entries(&self, name: &str) -> Result<Vec<EntrySummary>, Error>;
}
