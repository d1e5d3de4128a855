//! sw_fetch tool implementation.
//!
//! Issues a request on behalf of a client page, the way `fetch()` or a page
//! load would, and reports where the response came from.

use std::collections::BTreeMap;

use legallyup_client::resolve;
use legallyup_core::controller::ClientId;
use legallyup_core::{Destination, Error, Method, Request, RequestMode, ResponseSource, Strategy};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::SwState;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL or path relative to the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: "image", "font", "style", "script", "document", ...
    #[serde(default)]
    pub destination: Destination,

    /// Request mode. Use "navigate" for a page load.
    #[serde(default)]
    pub mode: RequestMode,

    /// Client page issuing the request (default: the page opened at startup).
    #[serde(default)]
    pub client: Option<ClientId>,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body, sent as UTF-8.
    #[serde(default)]
    pub body: Option<String>,

    /// Wait for a background revalidation to finish and report it.
    #[serde(default)]
    pub wait_for_revalidation: bool,
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RevalidationReport {
    /// Status of the refreshed response, if the network answered.
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub source: ResponseSource,
    pub strategy: Strategy,
    /// Present when a background refresh was started.
    pub revalidation: Option<RevalidationReport>,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(state: &SwState, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&state.origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let method: Method = params.method.parse()?;

    let mut request = Request::new(method, url).with_destination(params.destination).with_mode(params.mode);
    for (name, value) in params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let client = params.client.unwrap_or(state.default_client);
    let outcome = state.registration.fetch(client, request).await?;

    let revalidation = match outcome.revalidation {
        Some(pending) if params.wait_for_revalidation => Some(match pending.wait().await {
            Ok(fresh) => RevalidationReport { status: Some(fresh.status), error: None },
            Err(e) => RevalidationReport { status: None, error: Some(e.to_string()) },
        }),
        Some(_detached) => Some(RevalidationReport { status: None, error: None }),
        None => None,
    };

    let output = SwFetchOutput {
        url: outcome.response.url.clone(),
        status: outcome.response.status,
        body: outcome.response.text(),
        headers: outcome.response.headers,
        source: outcome.source,
        strategy: outcome.strategy,
        revalidation,
    };
    json_result(&output)
}
