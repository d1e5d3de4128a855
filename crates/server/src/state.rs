//! Process-wide state shared by every tool call.

use std::sync::Arc;

use legallyup_core::controller::{ClientId, RegisterOutcome};
use legallyup_core::{AppConfig, CacheController, CacheStorage, ControllerConfig, Error, Network, Registration};
use url::Url;

/// Storage, network and registration for one simulated browser profile.
pub struct SwState {
    pub config: AppConfig,
    pub origin: Url,
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub registration: Registration,
    /// Page used when a fetch names no client.
    pub default_client: ClientId,
}

impl SwState {
    pub async fn new(config: AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let registration = Registration::new(Arc::clone(&network));
        let default_client = registration.connect_client().await;
        Ok(Self { config, origin, storage, network, registration, default_client })
    }

    /// Build a controller from the loaded config, with optional overrides, and
    /// register it.
    pub async fn register(
        &self, version: Option<String>, static_assets: Option<Vec<String>>,
    ) -> Result<RegisterOutcome, Error> {
        let mut config = self.config.clone();
        if let Some(version) = version {
            config.cache_version = version;
        }
        if let Some(static_assets) = static_assets {
            config.static_assets = static_assets;
        }
        config.validate().map_err(|e| Error::InvalidInput(e.to_string()))?;

        let controller_config = ControllerConfig::from_app(&config).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let controller = Arc::new(CacheController::new(
            controller_config,
            Arc::clone(&self.storage),
            Arc::clone(&self.network),
        ));
        self.registration.register(controller).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::state;
    use legallyup_core::Phase;

    #[tokio::test]
    async fn test_register_default_manifest() {
        let (state, _storage, _network) = state().await;
        let outcome = state.register(None, None).await.unwrap();

        assert_eq!(outcome.version, "v1");
        assert_eq!(outcome.install.partition, "legallyup-static-v1");
        assert_eq!(outcome.claimed, 1);
        let active = state.registration.active().await.unwrap();
        assert_eq!(active.phase().await, Phase::Active);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_override() {
        let (state, _storage, _network) = state().await;
        let result = state.register(Some("v 2".into()), None).await;
        assert!(result.is_err());
        assert!(state.registration.active().await.is_none());
    }
}
