//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LEGALLYUP_SW_*)
//! 2. TOML config file (if LEGALLYUP_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LEGALLYUP_SW_*)
/// 2. TOML config file (if LEGALLYUP_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite partition store.
    ///
    /// Set via LEGALLYUP_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Keep partitions in memory instead of SQLite.
    ///
    /// Set via LEGALLYUP_SW_IN_MEMORY environment variable.
    #[serde(default)]
    pub in_memory: bool,

    /// Origin the app shell is served from. Manifest paths resolve against it.
    ///
    /// Set via LEGALLYUP_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix shared by all partition names.
    ///
    /// Set via LEGALLYUP_SW_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version suffix of all partition names. Bump on any manifest or policy change.
    ///
    /// Set via LEGALLYUP_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// App-shell paths stored on install, in order.
    ///
    /// Set via LEGALLYUP_SW_STATIC_ASSETS environment variable.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Keep the generic `{prefix}-{version}` partition during activation cleanup.
    ///
    /// Set via LEGALLYUP_SW_PRESERVE_LEGACY_CACHE environment variable.
    #[serde(default = "default_true")]
    pub preserve_legacy_cache: bool,

    /// User-Agent string for network requests.
    ///
    /// Set via LEGALLYUP_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body size in bytes.
    ///
    /// Set via LEGALLYUP_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network request timeout in milliseconds.
    ///
    /// Set via LEGALLYUP_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./legallyup-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:5173".into()
}

fn default_cache_prefix() -> String {
    "legallyup".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_static_assets() -> Vec<String> {
    vec!["/".into(), "/favicon.ico".into(), "/vite.svg".into()]
}

fn default_user_agent() -> String {
    "legallyup-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            in_memory: false,
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            static_assets: default_static_assets(),
            preserve_legacy_cache: true,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LEGALLYUP_SW_`
    /// 2. TOML file from `LEGALLYUP_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LEGALLYUP_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LEGALLYUP_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an http(s) URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        let url = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme: {scheme}") }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./legallyup-sw-cache.sqlite"));
        assert_eq!(config.user_agent, "legallyup-sw/0.1");
        assert_eq!(config.cache_prefix, "legallyup");
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.static_assets, vec!["/", "/favicon.ico", "/vite.svg"]);
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert!(config.preserve_legacy_cache);
        assert!(!config.in_memory);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig::default();
        assert_eq!(config.origin_url().unwrap().as_str(), "http://localhost:5173/");

        let config = AppConfig { origin: "ftp://legallyup.test".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_figment_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("sw.toml", "cache_version = \"v2\"\nstatic_assets = [\"/\", \"/app.js\"]")?;
            jail.set_env("LEGALLYUP_SW_CONFIG_FILE", "sw.toml");
            jail.set_env("LEGALLYUP_SW_CACHE_PREFIX", "lu");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_version, "v2");
            assert_eq!(config.cache_prefix, "lu");
            assert_eq!(config.static_assets, vec!["/", "/app.js"]);
            Ok(())
        });
    }
}
