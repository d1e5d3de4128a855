//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::SwState;
use crate::tools::cache::{CacheDeleteParams, CacheKeysParams, CacheMatchParams, delete_impl, keys_impl, match_impl};
use crate::tools::{
    ClientDisconnectParams, SwFetchParams, SwRegisterParams, connect_impl, disconnect_impl, fetch_impl,
    register_impl, status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for legallyup-sw.
#[derive(Clone)]
pub struct SwServer {
    state: Arc<SwState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwServer {
    /// Create a new server handler.
    pub fn new(state: Arc<SwState>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Register a controller version: store the app shell, delete partitions of older versions, and take control of every open page."
    )]
    async fn sw_register(&self, params: Parameters<SwRegisterParams>) -> Result<CallToolResult, McpError> {
        register_impl(&self.state, params.0).await
    }

    #[tool(description = "Show the active controller version, its phase, partition names and the open client pages.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.state).await
    }

    #[tool(description = "Open a client page. It is controlled by the active version, if any.")]
    async fn client_connect(&self) -> Result<CallToolResult, McpError> {
        connect_impl(&self.state).await
    }

    #[tool(description = "Close a client page.")]
    async fn client_disconnect(&self, params: Parameters<ClientDisconnectParams>) -> Result<CallToolResult, McpError> {
        disconnect_impl(&self.state, params.0).await
    }

    /// Issue a request from a client page.
    ///
    /// Controlled pages go through the caching strategy for the request's class;
    /// uncontrolled pages go straight to the network.
    #[tool(
        description = "Issue a request from a client page. Returns status, headers, body and whether it came from the network, a cache partition or an offline fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "List cache partitions in creation order with entry counts.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.state, params.0).await
    }

    #[tool(description = "Look up a cached response by URL and method, in one partition or all of them.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.state, params.0).await
    }

    #[tool(description = "Delete a cache partition and every entry in it.")]
    async fn cache_delete(&self, params: Parameters<CacheDeleteParams>) -> Result<CallToolResult, McpError> {
        delete_impl(&self.state, params.0).await
    }
}

impl ServerHandler for SwServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "legallyup-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
