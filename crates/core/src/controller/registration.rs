//! Lifecycle adapter: sequences install, activate and claim, and routes
//! fetches from client pages to whichever version controls them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use super::{ActivateOutcome, CacheController, FetchOutcome, InstallOutcome, ResponseSource};
use crate::Error;
use crate::controller::classify::Strategy;
use crate::http::Request;
use crate::network::Network;

pub type ClientId = u64;

/// An open client page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ClientInfo {
    pub id: ClientId,
    /// Version controlling this page, if any.
    pub controller: Option<String>,
}

/// Result of registering a new controller version.
#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct RegisterOutcome {
    pub version: String,
    pub install: InstallOutcome,
    pub activate: ActivateOutcome,
    /// Version that was active before, now superseded.
    pub superseded: Option<String>,
    /// Number of client pages now controlled by this version.
    pub claimed: usize,
}

/// Holds the active controller and the client pages it may control.
pub struct Registration {
    network: Arc<dyn Network>,
    active: RwLock<Option<Arc<CacheController>>>,
    clients: RwLock<BTreeMap<ClientId, Option<String>>>,
    next_client: AtomicU64,
    /// One registration at a time, so takeovers happen in call order.
    registering: Mutex<()>,
}

impl Registration {
    /// `network` serves pages no controller has claimed.
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self {
            network,
            active: RwLock::new(None),
            clients: RwLock::new(BTreeMap::new()),
            next_client: AtomicU64::new(1),
            registering: Mutex::new(()),
        }
    }

    pub async fn active(&self) -> Option<Arc<CacheController>> {
        self.active.read().await.clone()
    }

    /// Install `controller` and, once its shell is stored, hand it control.
    ///
    /// If install fails the previously active version keeps serving and the
    /// install error is returned. Overlapping calls queue up and take over in
    /// the order they were made.
    pub async fn register(&self, controller: Arc<CacheController>) -> Result<RegisterOutcome, Error> {
        let _registering = self.registering.lock().await;
        let install = controller.install().await?;

        // Fetches wait on this lock while the takeover runs.
        let mut active = self.active.write().await;
        let superseded = match active.take() {
            Some(previous) => {
                previous.supersede().await;
                Some(previous.version().to_string())
            }
            None => None,
        };
        let activate = controller.activate().await;
        *active = Some(Arc::clone(&controller));
        drop(active);

        let claimed = if activate.claim_clients { self.claim(controller.version()).await } else { 0 };

        tracing::info!(
            version = %controller.version(),
            superseded = ?superseded,
            claimed,
            "controller took over"
        );

        Ok(RegisterOutcome { version: controller.version().to_string(), install, activate, superseded, claimed })
    }

    async fn claim(&self, version: &str) -> usize {
        let mut clients = self.clients.write().await;
        for controller in clients.values_mut() {
            *controller = Some(version.to_string());
        }
        clients.len()
    }

    /// Open a client page. It is controlled by the active version, if any.
    pub async fn connect_client(&self) -> ClientId {
        let id = self.next_client.fetch_add(1, Ordering::Relaxed);
        let controller = self.active().await.map(|c| c.version().to_string());
        self.clients.write().await.insert(id, controller);
        id
    }

    /// Close a client page. Returns false if it was not open.
    pub async fn disconnect_client(&self, id: ClientId) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    pub async fn clients(&self) -> Vec<ClientInfo> {
        self.clients
            .read()
            .await
            .iter()
            .map(|(id, controller)| ClientInfo { id: *id, controller: controller.clone() })
            .collect()
    }

    /// Issue a request on behalf of a client page.
    ///
    /// Goes through the active controller only if it controls that page;
    /// otherwise straight to the network.
    pub async fn fetch(&self, client: ClientId, request: Request) -> Result<FetchOutcome, Error> {
        let controlled_by = self
            .clients
            .read()
            .await
            .get(&client)
            .cloned()
            .ok_or_else(|| Error::InvalidInput(format!("client {client} is not open")))?;

        let active = self.active().await;
        match (controlled_by, active) {
            (Some(version), Some(controller)) if controller.version() == version => controller.fetch(request).await,
            _ => {
                tracing::debug!("client {} is uncontrolled, passing {} through", client, request.url);
                let response = self.network.fetch(&request).await?;
                Ok(FetchOutcome { response, source: ResponseSource::Network, strategy: Strategy::NetworkOnly, revalidation: None })
            }
        }
    }
}
