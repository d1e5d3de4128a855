//! MCP tool implementations.
//!
//! This module contains all tools exposed by the legallyup-sw server.

pub mod cache;
pub mod client;
pub mod sw_fetch;
pub mod sw_register;
pub mod sw_status;

use legallyup_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use client::{ClientDisconnectParams, connect_impl, disconnect_impl};
pub use sw_fetch::{SwFetchParams, fetch_impl};
pub use sw_register::{SwRegisterParams, register_impl};
pub use sw_status::status_impl;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
