//! Named cache partitions behind a swappable storage trait.
//!
//! Two backends implement [`CacheStorage`]:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, migrations, partitions
//!   persist across restarts
//! - [`MemoryStorage`]: process-local, with failure injection for tests
//!
//! Entries are keyed by a SHA-256 of the request identity (method + URL).

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod partitions;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::RequestKey;
pub use memory::MemoryStorage;
pub use storage::{CacheStorage, EntrySummary};
