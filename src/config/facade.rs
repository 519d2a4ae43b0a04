//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::DeptreeConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and environment.
    pub fn load() -> Result<DeptreeConfig, ConfigError> {
        MergeService::load()
    }

    /// Load configuration with a specific file on top of the global one.
    pub fn load_from_file(path: &Path) -> Result<DeptreeConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    /// Load from `path` when given, otherwise from the standard sources.
    pub fn load_optional(path: Option<&Path>) -> Result<DeptreeConfig, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }
}
