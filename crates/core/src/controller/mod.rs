//! The cache controller.
//!
//! One controller instance is one deployed version of the offline layer. It
//! owns no state besides its lifecycle phase; everything persistent lives in
//! the injected [`CacheStorage`]. The host drives it through three handlers:
//!
//! - [`CacheController::install`]: populate the static shell, all or nothing
//! - [`CacheController::activate`]: drop partitions of older versions
//! - [`CacheController::fetch`]: serve one intercepted request
//!
//! [`Registration`] is the thin adapter that sequences these the way a browser
//! sequences service worker events.

pub mod activate;
pub mod classify;
pub mod fetch;
pub mod install;
pub mod names;
pub mod registration;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use crate::Error;
use crate::cache::CacheStorage;
use crate::config::{AppConfig, ConfigError};
use crate::network::Network;

pub use activate::ActivateOutcome;
pub use classify::{Strategy, classify};
pub use fetch::{FetchOutcome, ResponseSource, Revalidation};
pub use install::InstallOutcome;
pub use names::PartitionNames;
pub use registration::{ClientId, ClientInfo, RegisterOutcome, Registration};

/// Lifecycle phase of one controller version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Created, install not started.
    Parsed,
    Installing,
    /// Shell stored; ready to take over.
    Installed,
    Active,
    /// Replaced by a newer version.
    Superseded,
    /// Install failed; this version never serves anything.
    Redundant,
}

/// What a controller version needs to know about its deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub version: String,
    pub origin: Url,
    pub names: PartitionNames,
    /// App-shell paths, resolved against `origin` at install time.
    pub static_assets: Vec<String>,
    pub preserve_legacy_cache: bool,
}

impl ControllerConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin does not parse.
    pub fn from_app(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            version: config.cache_version.clone(),
            origin: config.origin_url()?,
            names: PartitionNames::from_config(config),
            static_assets: config.static_assets.clone(),
            preserve_legacy_cache: config.preserve_legacy_cache,
        })
    }
}

pub struct CacheController {
    config: ControllerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    phase: RwLock<Phase>,
}

impl CacheController {
    pub fn new(config: ControllerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self { config, storage, network, phase: RwLock::new(Phase::Parsed) }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn names(&self) -> &PartitionNames {
        &self.config.names
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.read().await
    }

    pub(crate) async fn set_phase(&self, phase: Phase) {
        let mut current = self.phase.write().await;
        tracing::debug!(version = %self.config.version, from = ?*current, to = ?phase, "controller phase change");
        *current = phase;
    }

    /// Mark this version as replaced by a newer one.
    pub async fn supersede(&self) {
        self.set_phase(Phase::Superseded).await;
    }

    /// Open one of this version's partitions for a steady-state write.
    ///
    /// Returns false without touching storage once the version is superseded
    /// or redundant. The phase lock is held across the open, so a takeover
    /// either sees the partition and deletes it or this call sees the takeover.
    pub(crate) async fn open_partition(&self, name: &str) -> Result<bool, Error> {
        let phase = self.phase.read().await;
        if matches!(*phase, Phase::Superseded | Phase::Redundant) {
            return Ok(false);
        }
        self.storage.open(name).await?;
        Ok(true)
    }

    /// The root document, used as the offline navigation fallback.
    pub fn root_url(&self) -> Url {
        let mut root = self.config.origin.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        root
    }
}

impl std::fmt::Debug for CacheController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheController")
            .field("version", &self.config.version)
            .field("names", &self.config.names)
            .finish_non_exhaustive()
    }
}
