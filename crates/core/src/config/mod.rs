//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STRATUS_*)
//! 2. TOML config file (if STRATUS_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Every policy tunable lives here so the worker itself holds no mutable
//! module-level state: version names, timeouts, freshness windows, size
//! caps, and the host/asset lists the classifier consults.

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
/// 1. Environment variables (STRATUS_*)
/// 2. TOML config file (if STRATUS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the controlled application. Critical-asset and fallback
    /// paths are resolved against this.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Aggregate cache identity, version embedded.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Name of the static (long-lived asset) partition.
    #[serde(default = "default_static_cache_name")]
    pub static_cache_name: String,

    /// Name of the dynamic (runtime response) partition.
    #[serde(default = "default_dynamic_cache_name")]
    pub dynamic_cache_name: String,

    /// Paths cached during install; failure to store any of them fails
    /// the install.
    #[serde(default = "default_critical_assets")]
    pub critical_assets: Vec<String>,

    /// URLs preloaded best-effort in the background after activation.
    #[serde(default)]
    pub secondary_assets: Vec<String>,

    /// Backend API hosts (network-first handling).
    #[serde(default)]
    pub api_hosts: Vec<String>,

    /// CDN hosts whose responses count as static assets.
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,

    /// Hosts the engine never touches (analytics, tracking).
    #[serde(default = "default_excluded_hosts")]
    pub excluded_hosts: Vec<String>,

    /// Document/navigation fetch timeout in milliseconds.
    #[serde(default = "default_document_timeout_ms")]
    pub document_timeout_ms: u64,

    /// API fetch timeout in milliseconds. Longer than the document
    /// timeout: API latency tolerance is higher.
    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: u64,

    /// Timeout for every other fetch, in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Age below which a dynamic entry is served as fresh, in seconds.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,

    /// Age past which the sweeper evicts annotated dynamic entries,
    /// in seconds.
    #[serde(default = "default_sweep_max_age_secs")]
    pub sweep_max_age_secs: u64,

    /// Interval between periodic sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Largest image body the engine will cache, in bytes.
    #[serde(default = "default_image_cache_max_bytes")]
    pub image_cache_max_bytes: u64,

    /// Upper bound on URLs accepted by a single prefetch command.
    #[serde(default = "default_prefetch_limit")]
    pub prefetch_limit: usize,

    /// Path of the cached document served when a navigation fetch fails.
    #[serde(default = "default_offline_fallback_path")]
    pub offline_fallback_path: String,

    /// User-Agent string for outgoing requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stratus-cache.sqlite")
}

fn default_origin() -> String {
    "https://app.example.com".into()
}

fn default_cache_name() -> String {
    "stratus-v1.0".into()
}

fn default_static_cache_name() -> String {
    "stratus-static-v1.0".into()
}

fn default_dynamic_cache_name() -> String {
    "stratus-dynamic-v1.0".into()
}

fn default_critical_assets() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/manifest.json".into()]
}

fn default_cdn_hosts() -> Vec<String> {
    vec!["cdn.jsdelivr.net".into()]
}

fn default_excluded_hosts() -> Vec<String> {
    vec!["google-analytics.com".into()]
}

fn default_document_timeout_ms() -> u64 {
    3_000
}

fn default_api_timeout_ms() -> u64 {
    8_000
}

fn default_fetch_timeout_ms() -> u64 {
    20_000
}

fn default_freshness_window_secs() -> u64 {
    300
}

fn default_sweep_max_age_secs() -> u64 {
    24 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60 * 60
}

fn default_image_cache_max_bytes() -> u64 {
    2 * 1024 * 1024
}

fn default_prefetch_limit() -> usize {
    10
}

fn default_offline_fallback_path() -> String {
    "/index.html".into()
}

fn default_user_agent() -> String {
    "stratus/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_name: default_cache_name(),
            static_cache_name: default_static_cache_name(),
            dynamic_cache_name: default_dynamic_cache_name(),
            critical_assets: default_critical_assets(),
            secondary_assets: Vec::new(),
            api_hosts: Vec::new(),
            cdn_hosts: default_cdn_hosts(),
            excluded_hosts: default_excluded_hosts(),
            document_timeout_ms: default_document_timeout_ms(),
            api_timeout_ms: default_api_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            freshness_window_secs: default_freshness_window_secs(),
            sweep_max_age_secs: default_sweep_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            image_cache_max_bytes: default_image_cache_max_bytes(),
            prefetch_limit: default_prefetch_limit(),
            offline_fallback_path: default_offline_fallback_path(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Document fetch timeout as a Duration.
    pub fn document_timeout(&self) -> Duration {
        Duration::from_millis(self.document_timeout_ms)
    }

    /// API fetch timeout as a Duration.
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    /// Default fetch timeout as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Freshness window for dynamic entries as a Duration.
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    /// Sweeper eviction age as a Duration.
    pub fn sweep_max_age(&self) -> Duration {
        Duration::from_secs(self.sweep_max_age_secs)
    }

    /// Interval between periodic sweeps as a Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// The partition names recognized by the current version. Anything
    /// else found in the store is garbage from a prior deploy.
    pub fn recognized_partitions(&self) -> [&str; 3] {
        [&self.cache_name, &self.static_cache_name, &self.dynamic_cache_name]
    }

    /// Resolve an application path (e.g. a critical asset) against the
    /// configured origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when the origin or the joined path
    /// does not parse as a URL.
    pub fn resolve_path(&self, path: &str) -> Result<url::Url, ConfigError> {
        let origin = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        origin
            .join(path)
            .map_err(|e| ConfigError::Invalid { field: "critical_assets".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STRATUS_`
    /// 2. TOML file from `STRATUS_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("STRATUS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("STRATUS_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./stratus-cache.sqlite"));
        assert_eq!(config.static_cache_name, "stratus-static-v1.0");
        assert_eq!(config.dynamic_cache_name, "stratus-dynamic-v1.0");
        assert_eq!(config.document_timeout_ms, 3_000);
        assert_eq!(config.api_timeout_ms, 8_000);
        assert_eq!(config.freshness_window_secs, 300);
        assert_eq!(config.sweep_max_age_secs, 86_400);
        assert_eq!(config.image_cache_max_bytes, 2 * 1024 * 1024);
        assert_eq!(config.prefetch_limit, 10);
        assert!(config.api_hosts.is_empty());
        assert!(config.secondary_assets.is_empty());
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.document_timeout(), Duration::from_millis(3_000));
        assert_eq!(config.api_timeout(), Duration::from_millis(8_000));
        assert_eq!(config.freshness_window(), Duration::from_secs(300));
    }

    #[test]
    fn test_recognized_partitions() {
        let config = AppConfig::default();
        let names = config.recognized_partitions();
        assert!(names.contains(&"stratus-static-v1.0"));
        assert!(names.contains(&"stratus-dynamic-v1.0"));
        assert!(names.contains(&"stratus-v1.0"));
    }

    #[test]
    fn test_resolve_path() {
        let config = AppConfig::default();
        let url = config.resolve_path("/index.html").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/index.html");

        let url = config.resolve_path("/").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/");
    }

    #[test]
    fn test_resolve_path_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(config.resolve_path("/").is_err());
    }
}
