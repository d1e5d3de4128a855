//! Core types and shared functionality for the LegallyUp offline layer.
//!
//! This crate provides:
//! - The cache controller and its install, activate and fetch handlers
//! - Partitioned response storage with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod network;

pub use cache::{CacheDb, CacheStorage, EntrySummary, MemoryStorage, RequestKey};
pub use config::{AppConfig, ConfigError};
pub use controller::{CacheController, ControllerConfig, FetchOutcome, Phase, Registration, ResponseSource, Strategy};
pub use error::Error;
pub use http::{Destination, Method, Request, RequestMode, Response};
pub use network::Network;
