//! cache_match tool implementation.
//!
//! Looks up a stored response by request identity.

use legallyup_client::resolve;
use legallyup_core::{Error, Method, RequestKey};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::SwState;
use crate::tools::json_result;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Absolute URL or path relative to the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Partition to search. Searches every partition in creation order if absent.
    #[serde(default)]
    pub partition: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub hash: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(state: &SwState, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&state.origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let method: Method = params.method.as_deref().unwrap_or("GET").parse()?;
    let key = RequestKey::new(method, &url);

    let hit = match &params.partition {
        Some(partition) => state.storage.match_entry(partition, &key).await?,
        None => state.storage.match_any(&key).await?,
    };
    let response = hit.ok_or_else(|| Error::CacheMiss(format!("{} {}", key.method, key.url)))?;

    let output = CacheMatchOutput {
        hash: key.hash,
        url: response.url.clone(),
        status: response.status,
        body: response.text(),
        headers: response.headers,
    };
    json_result(&output)
}
