//! sw_register tool implementation.
//!
//! Builds a controller version from config and runs install, activate and
//! claim for it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::SwState;

/// Parameters for the sw_register tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwRegisterParams {
    /// Version suffix for partition names. Defaults to the configured version.
    #[serde(default)]
    pub version: Option<String>,

    /// App-shell paths to store at install. Defaults to the configured manifest.
    #[serde(default)]
    pub static_assets: Option<Vec<String>>,
}

/// Implementation of the sw_register tool.
pub async fn register_impl(state: &SwState, params: SwRegisterParams) -> Result<CallToolResult, McpError> {
    let outcome = state.register(params.version, params.static_assets).await?;
    json_result(&outcome)
}
