//! Error types for registry access, cache storage, range resolution and the public API.

use thiserror::Error;

/// Errors raised by a registry client.
///
/// None of these are retried inside the crate; callers decide the retry policy.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("package not found in registry: {name}@{version}")]
    NotFound { name: String, version: String },

    #[error("registry transport error: {0}")]
    Transport(String),

    #[error("failed to decode registry response: {0}")]
    Decode(String),

    #[error("invalid package key: {0}")]
    InvalidKey(String),
}

impl RegistryError {
    pub fn not_found(name: &str, version: &str) -> Self {
        RegistryError::NotFound {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RegistryError::Decode(err.to_string())
        } else {
            RegistryError::Transport(err.to_string())
        }
    }
}

/// Cache storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to encode or decode cache entry: {0}")]
    Codec(String),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Codec(err.to_string())
    }
}

/// Failure to turn a declared dependency range into a concrete version.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("unsupported version spec for {name}: {spec}")]
    Unsupported { name: String, spec: String },

    #[error("no published version of {name} satisfies {spec}")]
    NoMatch { name: String, spec: String },
}

/// Top-level error surfaced by resolver and CLI operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// True when the root package (or its version spec) does not exist upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::Registry(RegistryError::NotFound { .. })
                | ApiError::Range(RangeError::NoMatch { .. })
        )
    }
}
