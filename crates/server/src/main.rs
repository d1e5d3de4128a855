//! legallyup-sw server entry point.
//!
//! Boots the offline cache controller behind an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use legallyup_client::{HttpNetwork, NetworkConfig};
use legallyup_core::{AppConfig, CacheDb, CacheStorage, MemoryStorage, Network};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let storage: Arc<dyn CacheStorage> = if config.in_memory {
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(CacheDb::open(&config.db_path).await?)
    };
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(NetworkConfig::from_app(&config))?);

    let state = state::SwState::new(config, storage, network).await?;

    match state.register(None, None).await {
        Ok(outcome) => tracing::info!(version = %outcome.version, stored = outcome.install.stored, "controller registered"),
        Err(e) => tracing::warn!(error = %e, "initial registration failed; pages stay uncontrolled until sw_register"),
    }

    tracing::info!(origin = %state.origin, "Starting legallyup-sw server on stdio transport");

    let handler = handler::SwServer::new(Arc::new(state));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
