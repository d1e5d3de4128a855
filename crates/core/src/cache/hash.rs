//! Request identity and cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::http::{Method, Request};

/// Compute the cache key for a request identity.
pub fn compute_cache_key(method: &Method, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Immutable `(method, url)` identity of a cache entry.
///
/// Fragments never reach the network, so they are dropped before hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: Method,
    pub url: String,
    pub hash: String,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        let url = url.to_string();
        let hash = compute_cache_key(&method, &url);
        Self { method, url, hash }
    }

    pub fn get(url: &Url) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn from_request(request: &Request) -> Self {
        Self::new(request.method.clone(), &request.url)
    }
}
