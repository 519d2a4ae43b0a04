//! In-memory registry for tests and offline runs.
//!
//! Records every call so tests can assert how many registry round trips a
//! resolution made, and can be told to fail specific lookups.

use crate::error::RegistryError;
use crate::registry::RegistryClient;
use crate::types::{Dependency, PackageKey, PackageRecord, VersionListing};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Failure injected for a mocked lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    NotFound,
    Transport,
}

impl MockFailure {
    fn to_error(self, name: &str, version: &str) -> RegistryError {
        match self {
            MockFailure::NotFound => RegistryError::not_found(name, version),
            MockFailure::Transport => {
                RegistryError::Transport(format!("injected failure for {}@{}", name, version))
            }
        }
    }
}

#[derive(Default)]
pub struct MockRegistry {
    packages: RwLock<HashMap<PackageKey, PackageRecord>>,
    fetch_failures: RwLock<HashMap<PackageKey, MockFailure>>,
    listing_failures: RwLock<HashMap<String, MockFailure>>,
    fetch_log: RwLock<Vec<PackageKey>>,
    listing_calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MockRegistry::add_package`].
    pub fn with_package(self, name: &str, version: &str, deps: &[(&str, &str)]) -> Self {
        self.add_package(name, version, deps);
        self
    }

    pub fn add_package(&self, name: &str, version: &str, deps: &[(&str, &str)]) {
        let record = PackageRecord::new(
            PackageKey::new(name, version),
            deps.iter()
                .map(|(dep, range)| Dependency::new(*dep, *range))
                .collect(),
        );
        self.insert(record);
    }

    /// Register a package with an explicit publish time and dev dependencies.
    pub fn add_package_with(
        &self,
        name: &str,
        version: &str,
        deps: &[(&str, &str)],
        dev_deps: &[(&str, &str)],
        created_at: Option<DateTime<Utc>>,
    ) {
        let mut record = PackageRecord::new(
            PackageKey::new(name, version),
            deps.iter()
                .map(|(dep, range)| Dependency::new(*dep, *range))
                .collect(),
        );
        record.dev_dependencies = dev_deps
            .iter()
            .map(|(dep, range)| Dependency::new(*dep, *range))
            .collect();
        record.created_at = created_at;
        self.insert(record);
    }

    pub fn insert(&self, record: PackageRecord) {
        self.packages.write().insert(record.key.clone(), record);
    }

    pub fn fail_fetch(&self, name: &str, version: &str, failure: MockFailure) {
        self.fetch_failures
            .write()
            .insert(PackageKey::new(name, version), failure);
    }

    pub fn fail_listing(&self, name: &str, failure: MockFailure) {
        self.listing_failures.write().insert(name.to_string(), failure);
    }

    pub fn clear_failures(&self) {
        self.fetch_failures.write().clear();
        self.listing_failures.write().clear();
    }

    /// Number of `fetch` calls made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_log.read().len()
    }

    /// Number of `fetch` calls made for one key.
    pub fn fetches_of(&self, key: &PackageKey) -> usize {
        self.fetch_log.read().iter().filter(|k| *k == key).count()
    }

    /// Number of `versions` calls made so far.
    pub fn listing_count(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    /// Total registry round trips of either kind.
    pub fn total_calls(&self) -> usize {
        self.fetch_count() + self.listing_count()
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    async fn fetch(&self, key: &PackageKey) -> Result<PackageRecord, RegistryError> {
        key.validate()?;
        self.fetch_log.write().push(key.clone());

        if let Some(failure) = self.fetch_failures.read().get(key) {
            return Err(failure.to_error(&key.name, &key.version));
        }

        let mut record = self
            .packages
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(&key.name, &key.version))?;
        record.fetched_at = Utc::now();
        Ok(record)
    }

    async fn versions(&self, name: &str) -> Result<VersionListing, RegistryError> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(failure) = self.listing_failures.read().get(name) {
            return Err(failure.to_error(name, "*"));
        }

        let packages = self.packages.read();
        let mut versions: Vec<String> = packages
            .keys()
            .filter(|k| k.name == name)
            .map(|k| k.version.clone())
            .collect();
        if versions.is_empty() {
            return Err(RegistryError::not_found(name, "*"));
        }
        versions.sort();

        let latest = versions
            .iter()
            .filter_map(|v| semver::Version::parse(v).ok())
            .filter(|v| v.pre.is_empty())
            .max();

        let listing = VersionListing::new(name, versions);
        Ok(match latest {
            Some(latest) => listing.with_tag("latest", &latest.to_string()),
            None => listing,
        })
    }
}
