//! Per-request strategy selection.

use serde::Serialize;

use crate::http::{Method, Request};

/// How an intercepted request is served. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Non-GET under `/api/`: straight to the network, no partition touched.
    NetworkOnly,
    /// GET under `/api/`: cached copy now, refresh in the background.
    StaleWhileRevalidate,
    /// Image, font, style or script: partition first, network on miss.
    CacheFirst,
    /// Page load: network, cached root document if the fetch is rejected.
    NetworkFirstRootFallback,
    /// Everything else: network, any cached copy if the fetch is rejected.
    NetworkFirst,
}

pub fn is_api_path(path: &str) -> bool {
    path.starts_with("/api/")
}

pub fn classify(request: &Request) -> Strategy {
    if is_api_path(request.url.path()) {
        if request.method == Method::Get {
            return Strategy::StaleWhileRevalidate;
        }
        return Strategy::NetworkOnly;
    }

    if request.destination.is_static_asset() {
        return Strategy::CacheFirst;
    }

    if request.is_navigation() {
        return Strategy::NetworkFirstRootFallback;
    }

    Strategy::NetworkFirst
}
