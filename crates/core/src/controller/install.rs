//! Install transition: store the app shell.

use futures_util::future::try_join_all;
use serde::Serialize;

use super::{CacheController, Phase};
use crate::Error;
use crate::cache::RequestKey;
use crate::http::{Request, Response};

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct InstallOutcome {
    pub partition: String,
    /// Distinct manifest entries now stored.
    pub stored: usize,
    /// Take over from the previous version without waiting for its clients to close.
    pub skip_waiting: bool,
}

impl CacheController {
    /// Populate the static partition from the manifest.
    ///
    /// Every entry is fetched before anything is written. One rejected fetch
    /// or non-2xx response fails the whole transition and the version becomes
    /// [`Phase::Redundant`]. Running it again with the same manifest leaves the
    /// same set of keys behind.
    pub async fn install(&self) -> Result<InstallOutcome, Error> {
        self.set_phase(Phase::Installing).await;

        match self.populate_shell().await {
            Ok(stored) => {
                self.set_phase(Phase::Installed).await;
                tracing::info!(
                    version = %self.version(),
                    partition = %self.names().static_assets,
                    stored,
                    "install complete"
                );
                Ok(InstallOutcome { partition: self.names().static_assets.clone(), stored, skip_waiting: true })
            }
            Err(e) => {
                self.set_phase(Phase::Redundant).await;
                tracing::warn!(version = %self.version(), error = %e, "install failed");
                Err(Error::InstallFailed(e.to_string()))
            }
        }
    }

    async fn populate_shell(&self) -> Result<usize, Error> {
        let partition = &self.names().static_assets;
        self.storage.open(partition).await?;

        let requests = self
            .config()
            .static_assets
            .iter()
            .map(|path| {
                self.config()
                    .origin
                    .join(path)
                    .map(Request::get)
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fetched = try_join_all(requests.iter().map(|request| self.fetch_shell_entry(request))).await?;

        let mut entries: Vec<(RequestKey, Response)> = Vec::with_capacity(fetched.len());
        for (key, response) in fetched {
            entries.retain(|(k, _)| k != &key);
            entries.push((key, response));
        }

        self.storage.put_all(partition, &entries).await?;
        Ok(entries.len())
    }

    async fn fetch_shell_entry(&self, request: &Request) -> Result<(RequestKey, Response), Error> {
        let response = self.network.fetch(request).await?;
        if !response.is_ok() {
            return Err(Error::HttpError(format!("{} returned status {}", request.url, response.status)));
        }
        Ok((RequestKey::from_request(request), response))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::{CacheDb, CacheStorage, MemoryStorage};
    use crate::controller::testing::{FakeNetwork, controller, url};

    fn shell_network() -> FakeNetwork {
        let network = FakeNetwork::new();
        network.respond("/", Response::new(200, "<!doctype html>"));
        network.respond("/favicon.ico", Response::new(200, "ico"));
        network.respond("/vite.svg", Response::new(200, "<svg/>"));
        network
    }

    #[tokio::test]
    async fn test_install_stores_manifest() {
        let storage = Arc::new(MemoryStorage::new());
        let ctrl = controller(storage.clone(), Arc::new(shell_network()));

        let outcome = ctrl.install().await.unwrap();

        assert_eq!(outcome.stored, 3);
        assert!(outcome.skip_waiting);
        assert_eq!(ctrl.phase().await, Phase::Installed);
        let root = storage
            .match_entry("legallyup-static-v1", &RequestKey::get(&url("/")))
            .await
            .unwrap();
        assert_eq!(root.unwrap().body, b"<!doctype html>");
    }

    #[tokio::test]
    async fn test_install_twice_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let ctrl = controller(storage.clone(), Arc::new(shell_network()));

        ctrl.install().await.unwrap();
        let mut first: Vec<String> = storage
            .entries("legallyup-static-v1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.hash)
            .collect();

        ctrl.install().await.unwrap();
        let mut second: Vec<String> = storage
            .entries("legallyup-static-v1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.hash)
            .collect();

        first.sort();
        second.sort();
        assert_eq!(first, second);
        assert_eq!(second.len(), 3);
        assert_eq!(storage.keys().await.unwrap(), vec!["legallyup-static-v1"]);
    }

    #[tokio::test]
    async fn test_install_fails_whole_on_one_rejected_fetch() {
        let storage = Arc::new(MemoryStorage::new());
        let network = shell_network();
        network.fail("/vite.svg");
        let ctrl = controller(storage.clone(), Arc::new(network));

        let result = ctrl.install().await;

        assert!(matches!(result, Err(Error::InstallFailed(_))));
        assert_eq!(ctrl.phase().await, Phase::Redundant);
        assert!(storage.entries("legallyup-static-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_fails_on_error_status() {
        let storage = Arc::new(MemoryStorage::new());
        let network = shell_network();
        network.respond("/favicon.ico", Response::new(404, "not found"));
        let ctrl = controller(storage.clone(), Arc::new(network));

        let err = ctrl.install().await.unwrap_err();

        assert!(err.to_string().contains("404"));
        assert!(storage.entries("legallyup-static-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_fails_when_storage_rejects_write() {
        let storage = Arc::new(MemoryStorage::new());
        storage.fail_writes(true);
        let ctrl = controller(storage.clone(), Arc::new(shell_network()));

        assert!(matches!(ctrl.install().await, Err(Error::InstallFailed(_))));
        assert_eq!(ctrl.phase().await, Phase::Redundant);
    }

    #[tokio::test]
    async fn test_duplicate_manifest_paths_store_once() {
        let storage = Arc::new(MemoryStorage::new());
        let mut config = crate::controller::testing::config();
        config.static_assets = vec!["/".into(), "/favicon.ico".into(), "/".into()];
        let ctrl = CacheController::new(config, storage.clone(), Arc::new(shell_network()));

        let outcome = ctrl.install().await.unwrap();
        assert_eq!(outcome.stored, 2);
    }

    #[tokio::test]
    async fn test_install_on_sqlite_then_serve_offline() {
        let storage = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let ctrl = controller(storage.clone(), Arc::new(shell_network()));

        ctrl.install().await.unwrap();
        ctrl.install().await.unwrap();
        ctrl.activate().await;

        assert_eq!(storage.entries("legallyup-static-v1").await.unwrap().len(), 3);
        let outcome = ctrl.fetch(Request::navigate(url("/pricing"))).await.unwrap();
        assert_eq!(outcome.response.body, b"<!doctype html>");
        assert_eq!(outcome.source, crate::controller::ResponseSource::Fallback);
    }
}
