//! cache_delete tool implementation.
//!
//! Deletes a partition and every entry in it.

use legallyup_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::SwState;
use crate::tools::json_result;

/// Parameters for the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteParams {
    /// Partition name, e.g. "legallyup-api-v1".
    pub name: String,
}

/// Output from the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteOutput {
    /// False if no such partition existed.
    pub deleted: bool,
}

/// Implementation of the cache_delete tool.
pub async fn delete_impl(state: &SwState, params: CacheDeleteParams) -> Result<CallToolResult, McpError> {
    if params.name.trim().is_empty() {
        return Err(Error::InvalidInput("name cannot be empty".into()).into());
    }

    let deleted = state.storage.delete(&params.name).await?;
    tracing::info!(partition = %params.name, deleted, "cache_delete");

    json_result(&CacheDeleteOutput { deleted })
}
