//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and pruning cache partitions,
//! the way `caches.keys()`, `caches.match()` and `caches.delete()` would.

pub mod delete;
pub mod keys;
pub mod lookup;

pub use delete::{CacheDeleteParams, delete_impl};
pub use keys::{CacheKeysParams, keys_impl};
pub use lookup::{CacheMatchParams, match_impl};
