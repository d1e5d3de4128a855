//! Steady state: serve intercepted requests.
//!
//! Cache writes happen after the response is settled and their failures are
//! logged, never returned. A rejected fetch with nothing to fall back on
//! surfaces as the original network error.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use super::CacheController;
use super::classify::{Strategy, classify};
use crate::Error;
use crate::cache::{CacheStorage, RequestKey};
use crate::http::{Request, Response};

/// Where a delivered response came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(tag = "kind", content = "partition", rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    /// Cache hit in the named partition.
    Cache(String),
    /// Served from cache because the network fetch was rejected.
    Fallback,
}

/// Background refresh started by stale-while-revalidate.
///
/// Dropping it detaches the task; awaiting [`Revalidation::wait`] observes the
/// network result after the cache write has been attempted.
#[derive(Debug)]
pub struct Revalidation {
    handle: JoinHandle<Result<Response, Error>>,
}

impl Revalidation {
    pub async fn wait(self) -> Result<Response, Error> {
        self.handle
            .await
            .map_err(|e| Error::Network(format!("revalidation task failed: {e}")))?
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
    pub strategy: Strategy,
    pub revalidation: Option<Revalidation>,
}

impl FetchOutcome {
    fn new(response: Response, source: ResponseSource, strategy: Strategy) -> Self {
        Self { response, source, strategy, revalidation: None }
    }
}

/// Write a response as a side effect. Failures are logged only.
async fn store(storage: &dyn CacheStorage, partition: &str, key: &RequestKey, response: &Response) {
    if let Err(e) = storage.put(partition, key, response).await {
        tracing::warn!(partition = %partition, url = %key.url, error = %e, "cache write failed");
    }
}

impl CacheController {
    /// Serve one intercepted request with the strategy its class calls for.
    pub async fn fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        let strategy = classify(&request);
        tracing::debug!("{} {} -> {:?}", request.method, request.url, strategy);

        match strategy {
            Strategy::NetworkOnly => {
                let response = self.network.fetch(&request).await?;
                Ok(FetchOutcome::new(response, ResponseSource::Network, strategy))
            }
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirstRootFallback => self.network_first_root(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
        }
    }

    /// Cache read that degrades to a miss on storage failure.
    async fn lookup(&self, partition: &str, key: &RequestKey) -> Option<Response> {
        match self.storage.match_entry(partition, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(partition = %partition, url = %key.url, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn lookup_any(&self, key: &RequestKey) -> Option<Response> {
        match self.storage.match_any(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %key.url, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn prepare_partition(&self, partition: &str) {
        match self.open_partition(partition).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(partition = %partition, "version retired, not opening partition"),
            Err(e) => tracing::warn!(partition = %partition, error = %e, "failed to open partition"),
        }
    }

    /// Fetch and, on a cacheable response, write it. Runs detached.
    ///
    /// The write lands only if the partition still exists when the network
    /// answers.
    fn spawn_revalidation(&self, request: Request, key: RequestKey, partition: String) -> Revalidation {
        let storage = Arc::clone(&self.storage);
        let network = Arc::clone(&self.network);

        let handle = tokio::spawn(async move {
            let response = match network.fetch(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("revalidation of {} failed: {}", key.url, e);
                    return Err(e);
                }
            };
            if response.is_cacheable() {
                store(storage.as_ref(), &partition, &key, &response).await;
            }
            Ok(response)
        });

        Revalidation { handle }
    }

    async fn stale_while_revalidate(&self, request: Request) -> Result<FetchOutcome, Error> {
        let partition = self.names().api.clone();
        self.prepare_partition(&partition).await;

        let key = RequestKey::from_request(&request);
        let revalidation = self.spawn_revalidation(request, key.clone(), partition.clone());

        match self.lookup(&partition, &key).await {
            Some(cached) => {
                tracing::debug!("cache hit for {}, revalidating in background", key.url);
                Ok(FetchOutcome {
                    response: cached,
                    source: ResponseSource::Cache(partition),
                    strategy: Strategy::StaleWhileRevalidate,
                    revalidation: Some(revalidation),
                })
            }
            None => {
                let response = revalidation.wait().await?;
                Ok(FetchOutcome::new(response, ResponseSource::Network, Strategy::StaleWhileRevalidate))
            }
        }
    }

    async fn cache_first(&self, request: Request) -> Result<FetchOutcome, Error> {
        let partition = &self.names().static_assets;
        self.prepare_partition(partition).await;
        let key = RequestKey::from_request(&request);

        if let Some(cached) = self.lookup(partition, &key).await {
            tracing::debug!("cache hit for {}", key.url);
            return Ok(FetchOutcome::new(cached, ResponseSource::Cache(partition.clone()), Strategy::CacheFirst));
        }

        let response = self.network.fetch(&request).await?;
        if response.is_cacheable() {
            store(self.storage.as_ref(), partition, &key, &response).await;
        }
        Ok(FetchOutcome::new(response, ResponseSource::Network, Strategy::CacheFirst))
    }

    async fn network_first_root(&self, request: Request) -> Result<FetchOutcome, Error> {
        let strategy = Strategy::NetworkFirstRootFallback;
        match self.network.fetch(&request).await {
            Ok(response) => Ok(FetchOutcome::new(response, ResponseSource::Network, strategy)),
            Err(e) => {
                let root = RequestKey::get(&self.root_url());
                match self.lookup_any(&root).await {
                    Some(cached) => {
                        tracing::debug!("navigation to {} failed ({}), serving cached root", request.url, e);
                        Ok(FetchOutcome::new(cached, ResponseSource::Fallback, strategy))
                    }
                    None => Err(e),
                }
            }
        }
    }

    async fn network_first(&self, request: Request) -> Result<FetchOutcome, Error> {
        match self.network.fetch(&request).await {
            Ok(response) => Ok(FetchOutcome::new(response, ResponseSource::Network, Strategy::NetworkFirst)),
            Err(e) => {
                let key = RequestKey::from_request(&request);
                match self.lookup_any(&key).await {
                    Some(cached) => {
                        tracing::debug!("fetch of {} failed ({}), serving cached copy", key.url, e);
                        Ok(FetchOutcome::new(cached, ResponseSource::Fallback, Strategy::NetworkFirst))
                    }
                    None => Err(e),
                }
            }
        }
    }
}
