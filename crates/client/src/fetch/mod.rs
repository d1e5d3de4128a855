//! HTTP network backend for the cache controller.
//!
//! ### Rejection vs. response
//! - Connection failures, DNS errors, timeouts and oversized bodies are
//!   rejections (`Err`); the controller may fall back to cache on them.
//! - Any status that arrived, 404 and 500 included, is a response (`Ok`).
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve};

use legallyup_core::{AppConfig, Error, Network, Request, Response};

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// User agent string (default: "legallyup-sw/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: "legallyup-sw/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl NetworkConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// Network backed by a shared reqwest client.
pub struct HttpNetwork {
    http: Client,
    config: NetworkConfig,
}

impl HttpNetwork {
    /// Create a new network with the given configuration.
    pub fn new(config: NetworkConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> Error {
        Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

fn rejection(url: &::url::Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{}: {}", url, err))
    } else {
        Error::Network(format!("failed to fetch {}: {}", url, err))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| rejection(&request.url, e))?;

        let status = response.status();
        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize));
        }

        let final_url = response.url().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes: Bytes = response.bytes().await.map_err(|e| rejection(&request.url, e))?;
        if bytes.len() > self.config.max_bytes {
            return Err(self.too_large(bytes.len()));
        }

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes, {})",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len(),
            content_type.as_deref().unwrap_or("no content-type")
        );

        Ok(Response { status: status.as_u16(), headers, body: bytes.to_vec(), url: final_url })
    }
}
