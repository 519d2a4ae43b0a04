//! Package Cache Store
//!
//! Durable cache of normalized registry metadata keyed by (name, version), plus
//! version listings keyed by name. Entries older than the freshness window are
//! reported as misses so the resolver refetches them.

pub mod clock;
pub mod persistence;

use crate::error::StorageError;
use crate::types::{PackageKey, PackageRecord, VersionListing};

pub use clock::{Clock, ManualClock, SystemClock};
pub use persistence::SledCacheStore;

/// Default freshness window: one day
pub const DEFAULT_FRESHNESS_SECS: u64 = 24 * 60 * 60;

/// Result of an internal cache lookup.
///
/// Callers of [`CacheStore::get`] only see `Fresh` as a hit; `Stale` and
/// `Absent` are both misses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    Fresh(T),
    Stale(T),
    Absent,
}

impl<T> CacheLookup<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            CacheLookup::Fresh(value) => Some(value),
            CacheLookup::Stale(_) | CacheLookup::Absent => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, CacheLookup::Stale(_))
    }
}

/// Cache Store interface
///
/// Writes are per-key atomic and last-write-wins; a reader never observes a
/// partially written record.
pub trait CacheStore: Send + Sync {
    /// Fresh record for `key`, or `None` when absent or stale.
    fn get(&self, key: &PackageKey) -> Result<Option<PackageRecord>, StorageError>;

    /// Store `record`, stamping `fetched_at` with the current time. Durable on return.
    fn put(&self, record: &PackageRecord) -> Result<PackageRecord, StorageError>;

    /// Every stored record, fresh or stale, ordered by key.
    fn all_entries(&self) -> Result<Vec<PackageRecord>, StorageError>;

    /// Fresh version listing for `name`, or `None`.
    fn get_listing(&self, name: &str) -> Result<Option<VersionListing>, StorageError>;

    /// Store a version listing, stamping `fetched_at`. Durable on return.
    fn put_listing(&self, listing: &VersionListing) -> Result<VersionListing, StorageError>;
}
