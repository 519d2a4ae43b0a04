//! Core types for package identity and normalized registry metadata.

use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// PackageKey: exact (name, version) identity of one registry entry.
///
/// Equality is exact string equality on both fields; no range matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageKey {
    pub name: String,
    pub version: String,
}

impl PackageKey {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Check that the key names a concrete registry entry.
    ///
    /// The name must be non-empty and the version must parse as a semver
    /// version (a leading `v` is tolerated); ranges and tags are rejected.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::InvalidKey(
                "package name cannot be empty".to_string(),
            ));
        }
        if !is_concrete_version(&self.version) {
            return Err(RegistryError::InvalidKey(format!(
                "{} is not a concrete version of {}",
                self.version, self.name
            )));
        }
        Ok(())
    }

    /// The same key with the version trimmed and a leading `v` dropped, so
    /// `tap@v0.4.0` and `tap@0.4.0` name one cache entry.
    pub fn normalized(&self) -> PackageKey {
        let version = self.version.trim();
        PackageKey::new(
            self.name.trim(),
            version.strip_prefix('v').unwrap_or(version),
        )
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// True when `version` is an exact semver version rather than a range or tag.
pub fn is_concrete_version(version: &str) -> bool {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(version).is_ok()
}

/// One declared dependency edge: the dependency name and its declared range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub range: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
        }
    }
}

/// PackageRecord: normalized metadata for one package version.
///
/// `dependencies` keeps the order in which the registry listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub key: PackageKey,
    pub dependencies: Vec<Dependency>,
    pub dev_dependencies: Vec<Dependency>,
    /// Publish time reported by the registry
    pub created_at: Option<DateTime<Utc>>,
    /// When this record was fetched or last written to the cache
    pub fetched_at: DateTime<Utc>,
}

impl PackageRecord {
    pub fn new(key: PackageKey, dependencies: Vec<Dependency>) -> Self {
        Self {
            key,
            dependencies,
            dev_dependencies: Vec::new(),
            created_at: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn dependency_names(&self) -> Vec<&str> {
        self.dependencies.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Published versions and dist-tags of a package name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionListing {
    pub name: String,
    pub versions: Vec<String>,
    pub dist_tags: BTreeMap<String, String>,
    pub fetched_at: DateTime<Utc>,
}

impl VersionListing {
    pub fn new(name: impl Into<String>, versions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            versions,
            dist_tags: BTreeMap::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn with_tag(mut self, tag: &str, version: &str) -> Self {
        self.dist_tags.insert(tag.to_string(), version.to_string());
        self
    }
}
