//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, the global
//! `$XDG_CONFIG_HOME/deptree/config.toml`, an optional explicit file, and
//! `DEPTREE__*` environment variables, lowest to highest precedence.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::cache::DEFAULT_FRESHNESS_SECS;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::registry::npm::DEFAULT_REGISTRY_URL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeptreeConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DeptreeConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.registry.validate()?;
        self.resolver.validate()?;
        Ok(())
    }
}

/// Registry endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the npm-compatible registry
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ApiError::ConfigError(format!(
                "Invalid registry endpoint URL: {}",
                self.endpoint
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ApiError::ConfigError(
                "registry.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Cache storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory; None means `$XDG_CACHE_HOME/deptree/cache`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum age of a cached entry in seconds
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
}

fn default_freshness_secs() -> u64 {
    DEFAULT_FRESHNESS_SECS
}

impl CacheConfig {
    /// Resolve the cache directory to an actual filesystem location.
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => xdg::default_cache_dir(),
        }
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            freshness_secs: default_freshness_secs(),
        }
    }
}

/// Tree resolver tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum sibling subtrees and registry requests in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Depth below the root at which expansion stops; None is unlimited
    #[serde(default)]
    pub max_depth: Option<usize>,
}

fn default_concurrency() -> usize {
    8
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.concurrency == 0 {
            return Err(ApiError::ConfigError(
                "resolver.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_depth: None,
        }
    }
}
