//! Version-bearing partition names.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// The three partitions one controller version knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionNames {
    /// App shell: root document, icons, fonts, scripts, styles, images.
    pub static_assets: String,
    /// GET responses under `/api/`.
    pub api: String,
    /// Generic name from before the cache was split. Never written.
    pub legacy: String,
}

impl PartitionNames {
    /// `{prefix}-static-{version}`, `{prefix}-api-{version}`, `{prefix}-{version}`.
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            static_assets: format!("{prefix}-static-{version}"),
            api: format!("{prefix}-api-{version}"),
            legacy: format!("{prefix}-{version}"),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.cache_prefix, &config.cache_version)
    }

    /// Names that survive activation cleanup.
    pub fn known_set(&self, preserve_legacy: bool) -> Vec<&str> {
        let mut known = vec![self.static_assets.as_str(), self.api.as_str()];
        if preserve_legacy {
            known.push(self.legacy.as_str());
        }
        known
    }
}
