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

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - any timeout is under 100ms or over 5 minutes
    /// - `image_cache_max_bytes` is 0 or exceeds 50MB
    /// - `prefetch_limit` is 0 or exceeds 50
    /// - the partition names are empty or collide
    /// - `origin` does not parse as an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("document_timeout_ms", self.document_timeout_ms),
            ("api_timeout_ms", self.api_timeout_ms),
            ("fetch_timeout_ms", self.fetch_timeout_ms),
        ] {
            if value < 100 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
            }
            if value > 300_000 {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.image_cache_max_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "image_cache_max_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.image_cache_max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid {
                field: "image_cache_max_bytes".into(),
                reason: "must not exceed 50MB".into(),
            });
        }

        if self.prefetch_limit == 0 || self.prefetch_limit > 50 {
            return Err(ConfigError::Invalid {
                field: "prefetch_limit".into(),
                reason: "must be between 1 and 50".into(),
            });
        }

        let names = self.recognized_partitions();
        if names.iter().any(|n| n.is_empty()) {
            return Err(ConfigError::Invalid { field: "cache_name".into(), reason: "must not be empty".into() });
        }
        if self.static_cache_name == self.dynamic_cache_name {
            return Err(ConfigError::Invalid {
                field: "dynamic_cache_name".into(),
                reason: "must differ from static_cache_name".into(),
            });
        }

        match url::Url::parse(&self.origin) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: format!("unsupported scheme: {}", url.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::Invalid { field: "origin".into(), reason: e.to_string() });
            }
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.freshness_window_secs >= self.sweep_max_age_secs {
            tracing::warn!(
                freshness_window_secs = self.freshness_window_secs,
                sweep_max_age_secs = self.sweep_max_age_secs,
                "freshness window is not shorter than the sweep age; \
                 stale entries will be evicted before they can be served"
            );
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
    fn test_validate_timeout_too_small() {
        let config = AppConfig { document_timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "document_timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { api_timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_timeout_ms"));
    }

    #[test]
    fn test_validate_image_cap_zero() {
        let config = AppConfig { image_cache_max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "image_cache_max_bytes"));
    }

    #[test]
    fn test_validate_prefetch_limit_bounds() {
        let config = AppConfig { prefetch_limit: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { prefetch_limit: 51, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { prefetch_limit: 50, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_partition_name_collision() {
        let config = AppConfig {
            static_cache_name: "same-v1".into(),
            dynamic_cache_name: "same-v1".into(),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "dynamic_cache_name"));
    }

    #[test]
    fn test_validate_bad_origin_scheme() {
        let config = AppConfig { origin: "ftp://example.com".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }
}
