//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn check_name_part(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must not contain whitespace".into() });
    }
    Ok(())
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        return Ok(());
    }
    Err(ConfigError::Invalid { field: field.into(), reason: format!("{value} is outside {min}..={max}") })
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_prefix` or `cache_version` is empty or contains whitespace
    /// - `origin` is not an http(s) URL
    /// - `static_assets` is empty or has a path not starting with `/`
    /// - `max_bytes` is outside 1 byte..=50MB
    /// - `timeout_ms` is outside 100ms..=5 minutes
    /// - `user_agent` is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_name_part("cache_prefix", &self.cache_prefix)?;
        check_name_part("cache_version", &self.cache_version)?;

        self.origin_url()?;

        if self.static_assets.is_empty() {
            return Err(ConfigError::Invalid {
                field: "static_assets".into(),
                reason: "must list at least the root document".into(),
            });
        }
        if let Some(bad) = self.static_assets.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "static_assets".into(),
                reason: format!("path must start with '/': {bad}"),
            });
        }
        if !self.static_assets.iter().any(|p| p == "/") {
            tracing::warn!("static_assets has no root document; offline navigation fallback will miss");
        }

        check_range("max_bytes", self.max_bytes as u64, 1, 50 * 1024 * 1024)?;
        check_range("timeout_ms", self.timeout_ms, 100, 300_000)?;

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must be set".into() });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version() {
        let config = AppConfig { cache_version: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_prefix_whitespace() {
        let config = AppConfig { cache_prefix: "legally up".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_prefix"));
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_empty_manifest() {
        let config = AppConfig { static_assets: Vec::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "static_assets"));
    }

    #[test]
    fn test_validate_relative_manifest_path() {
        let config = AppConfig { static_assets: vec!["/".into(), "favicon.ico".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "static_assets"));
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_range_bounds_inclusive() {
        let low = AppConfig { max_bytes: 1, timeout_ms: 100, ..Default::default() };
        assert!(low.validate().is_ok());
        let high = AppConfig { max_bytes: 50 * 1024 * 1024, timeout_ms: 300_000, ..Default::default() };
        assert!(high.validate().is_ok());
        let over = AppConfig { timeout_ms: 300_001, ..Default::default() };
        assert!(over.validate().is_err());
    }
}
