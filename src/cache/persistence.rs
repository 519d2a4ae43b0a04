//! sled-backed Cache Store

use crate::cache::{CacheLookup, CacheStore, Clock, SystemClock};
use crate::error::StorageError;
use crate::types::{PackageKey, PackageRecord, VersionListing};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const RECORDS_TREE: &str = "records";
const LISTINGS_TREE: &str = "listings";

/// Cache Store persisted in a sled database directory.
///
/// Lifecycle: [`SledCacheStore::open`] loads the database, gets and puts are
/// served from it, and [`SledCacheStore::close`] flushes outstanding writes.
pub struct SledCacheStore {
    db: sled::Db,
    records: sled::Tree,
    listings: sled::Tree,
    path: PathBuf,
    freshness: Duration,
    clock: Arc<dyn Clock>,
}

impl SledCacheStore {
    /// Open (or create) the cache at `path` using the wall clock.
    pub fn open(path: &Path, freshness: Duration) -> Result<Self, StorageError> {
        Self::open_with_clock(path, freshness, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        path: &Path,
        freshness: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        let records = db.open_tree(RECORDS_TREE)?;
        let listings = db.open_tree(LISTINGS_TREE)?;
        debug!(path = %path.display(), entries = records.len(), "Opened package cache");
        Ok(Self {
            db,
            records,
            listings,
            path: path.to_path_buf(),
            freshness,
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness
    }

    /// Look up `key`, distinguishing stale entries from absent ones.
    pub fn lookup(&self, key: &PackageKey) -> Result<CacheLookup<PackageRecord>, StorageError> {
        let Some(record) = self.read::<PackageRecord>(&self.records, &record_key(key))? else {
            return Ok(CacheLookup::Absent);
        };
        if self.is_fresh(record.fetched_at) {
            Ok(CacheLookup::Fresh(record))
        } else {
            Ok(CacheLookup::Stale(record))
        }
    }

    pub fn lookup_listing(&self, name: &str) -> Result<CacheLookup<VersionListing>, StorageError> {
        let Some(listing) = self.read::<VersionListing>(&self.listings, name.as_bytes())? else {
            return Ok(CacheLookup::Absent);
        };
        if self.is_fresh(listing.fetched_at) {
            Ok(CacheLookup::Fresh(listing))
        } else {
            Ok(CacheLookup::Stale(listing))
        }
    }

    /// Remove one record. Returns whether it existed.
    pub fn remove(&self, key: &PackageKey) -> Result<bool, StorageError> {
        let existed = self.records.remove(record_key(key))?.is_some();
        self.db.flush()?;
        Ok(existed)
    }

    /// Drop every stale record and listing. Returns how many entries were removed.
    pub fn prune_stale(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        for record in self.all_entries()? {
            if !self.is_fresh(record.fetched_at) {
                self.records.remove(record_key(&record.key))?;
                removed += 1;
            }
        }
        for item in self.listings.iter() {
            let (key, value) = item?;
            match bincode::deserialize::<VersionListing>(&value) {
                Ok(listing) if self.is_fresh(listing.fetched_at) => {}
                _ => {
                    self.listings.remove(key)?;
                    removed += 1;
                }
            }
        }
        self.db.flush()?;
        Ok(removed)
    }

    /// Remove everything. Returns the number of records that were stored.
    pub fn clear(&self) -> Result<usize, StorageError> {
        let count = self.records.len();
        self.records.clear()?;
        self.listings.clear()?;
        self.db.flush()?;
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flush and release the database.
    pub fn close(self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>) -> bool {
        match (self.clock.now() - fetched_at).to_std() {
            Ok(age) => age < self.freshness,
            // fetched_at in the future (clock skew): treat as just fetched
            Err(_) => true,
        }
    }

    fn read<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
        key: &[u8],
    ) -> Result<Option<T>, StorageError> {
        let Some(bytes) = tree.get(key)? else {
            return Ok(None);
        };
        match bincode::deserialize::<T>(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    key = %String::from_utf8_lossy(key),
                    "Discarding undecodable cache entry: {}",
                    e
                );
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(
        &self,
        tree: &sled::Tree,
        key: &[u8],
        value: &T,
    ) -> Result<(), StorageError> {
        let bytes = bincode::serialize(value)?;
        tree.insert(key, bytes)?;
        self.db.flush()?;
        Ok(())
    }
}

impl CacheStore for SledCacheStore {
    fn get(&self, key: &PackageKey) -> Result<Option<PackageRecord>, StorageError> {
        Ok(self.lookup(key)?.fresh())
    }

    fn put(&self, record: &PackageRecord) -> Result<PackageRecord, StorageError> {
        let mut stored = record.clone();
        stored.fetched_at = self.clock.now();
        self.write(&self.records, &record_key(&stored.key), &stored)?;
        Ok(stored)
    }

    fn all_entries(&self) -> Result<Vec<PackageRecord>, StorageError> {
        let mut entries = Vec::with_capacity(self.records.len());
        for item in self.records.iter() {
            let (key, value) = item?;
            match bincode::deserialize::<PackageRecord>(&value) {
                Ok(record) => entries.push(record),
                Err(e) => warn!(
                    key = %String::from_utf8_lossy(&key),
                    "Skipping undecodable cache entry: {}",
                    e
                ),
            }
        }
        Ok(entries)
    }

    fn get_listing(&self, name: &str) -> Result<Option<VersionListing>, StorageError> {
        Ok(self.lookup_listing(name)?.fresh())
    }

    fn put_listing(&self, listing: &VersionListing) -> Result<VersionListing, StorageError> {
        let mut stored = listing.clone();
        stored.fetched_at = self.clock.now();
        self.write(&self.listings, stored.name.as_bytes(), &stored)?;
        Ok(stored)
    }
}

/// `name`, NUL, `version`. Sorts by name then version.
fn record_key(key: &PackageKey) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(key.name.len() + key.version.len() + 1);
    bytes.extend_from_slice(key.name.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(key.version.as_bytes());
    bytes
}
