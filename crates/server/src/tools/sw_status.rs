//! sw_status tool implementation.

use legallyup_core::Phase;
use legallyup_core::controller::{ClientInfo, PartitionNames};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

use super::json_result;
use crate::state::SwState;

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ActiveVersion {
    pub version: String,
    pub phase: Phase,
    pub partitions: PartitionNames,
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwStatusOutput {
    /// Controlling version, absent until a registration succeeds.
    pub active: Option<ActiveVersion>,
    pub clients: Vec<ClientInfo>,
    pub default_client: u64,
}

/// Implementation of the sw_status tool.
pub async fn status_impl(state: &SwState) -> Result<CallToolResult, McpError> {
    let active = match state.registration.active().await {
        Some(controller) => Some(ActiveVersion {
            version: controller.version().to_string(),
            phase: controller.phase().await,
            partitions: controller.names().clone(),
        }),
        None => None,
    };

    let output =
        SwStatusOutput { active, clients: state.registration.clients().await, default_client: state.default_client };
    json_result(&output)
}
