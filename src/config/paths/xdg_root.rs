//! XDG Base Directory utilities for cache and config locations.

use crate::error::ApiError;
use std::path::PathBuf;

/// Get XDG cache home directory
///
/// Returns `$XDG_CACHE_HOME` if set, otherwise defaults to `$HOME/.cache`
pub fn cache_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_cache_home) = std::env::var("XDG_CACHE_HOME") {
        if !xdg_cache_home.is_empty() {
            return Ok(PathBuf::from(xdg_cache_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        ApiError::ConfigError(
            "Could not determine XDG cache home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".cache"))
}

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
/// Follows XDG Base Directory Specification
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        ApiError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// Default package cache directory: `$XDG_CACHE_HOME/deptree/cache`
pub fn default_cache_dir() -> Result<PathBuf, ApiError> {
    Ok(cache_home()?.join("deptree").join("cache"))
}

/// Global config file: `$XDG_CONFIG_HOME/deptree/config.toml`
pub fn global_config_file() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join("deptree").join("config.toml"))
}
