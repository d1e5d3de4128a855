//! client_connect and client_disconnect tool implementations.
//!
//! A client is a simulated open page. Only pages opened or claimed while a
//! version is active have their fetches intercepted.

use legallyup_core::Error;
use legallyup_core::controller::ClientId;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::SwState;

/// Output from the client_connect tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientConnectOutput {
    pub client: ClientId,
    /// Version controlling the new page, if one is active.
    pub controller: Option<String>,
}

/// Parameters for the client_disconnect tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientDisconnectParams {
    pub client: ClientId,
}

/// Implementation of the client_connect tool.
pub async fn connect_impl(state: &SwState) -> Result<CallToolResult, McpError> {
    let client = state.registration.connect_client().await;
    let controller = state
        .registration
        .clients()
        .await
        .into_iter()
        .find(|c| c.id == client)
        .and_then(|c| c.controller);
    json_result(&ClientConnectOutput { client, controller })
}

/// Implementation of the client_disconnect tool.
pub async fn disconnect_impl(state: &SwState, params: ClientDisconnectParams) -> Result<CallToolResult, McpError> {
    if !state.registration.disconnect_client(params.client).await {
        return Err(Error::InvalidInput(format!("client {} is not open", params.client)).into());
    }
    json_result(&serde_json::json!({ "disconnected": params.client }))
}
