//! Registry access
//!
//! The resolver talks to a package registry only through [`RegistryClient`].
//! Implementations normalize whatever the registry returns into
//! [`PackageRecord`] and [`VersionListing`]; nothing past this boundary sees
//! raw registry documents.

pub mod mock;
pub mod npm;
pub mod range;

use crate::error::RegistryError;
use crate::types::{PackageKey, PackageRecord, VersionListing};
use async_trait::async_trait;

pub use mock::{MockFailure, MockRegistry};
pub use npm::NpmRegistryClient;

/// Client for a remote package registry.
///
/// Implementations perform no retries; a failed call is reported once and the
/// caller decides what to do with it.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch metadata for one concrete package version.
    ///
    /// Fails with [`RegistryError::InvalidKey`] before any network call when the
    /// key has an empty name or a non-concrete version.
    async fn fetch(&self, key: &PackageKey) -> Result<PackageRecord, RegistryError>;

    /// List every published version and dist-tag of a package name.
    async fn versions(&self, name: &str) -> Result<VersionListing, RegistryError>;
}
