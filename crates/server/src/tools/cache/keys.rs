//! cache_keys tool implementation.
//!
//! Lists partitions in creation order with their entry counts.

use legallyup_core::EntrySummary;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::SwState;
use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Also list the entries of each partition.
    #[serde(default)]
    pub include_entries: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PartitionSummary {
    pub name: String,
    pub entry_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntrySummary>>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub partitions: Vec<PartitionSummary>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(state: &SwState, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let mut partitions = Vec::new();
    for name in state.storage.keys().await? {
        let entries = state.storage.entries(&name).await?;
        partitions.push(PartitionSummary {
            entry_count: entries.len(),
            entries: params.include_entries.then_some(entries),
            name,
        });
    }

    json_result(&CacheKeysOutput { partitions })
}
