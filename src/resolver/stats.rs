//! Resolution counters

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot of a resolver's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub registry_fetches: usize,
    pub listing_fetches: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl ResolveStats {
    pub fn registry_calls(&self) -> usize {
        self.registry_fetches + self.listing_fetches
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    registry_fetches: AtomicUsize,
    listing_fetches: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

impl Counters {
    pub(crate) fn registry_fetch(&self) {
        self.registry_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn listing_fetch(&self) {
        self.listing_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ResolveStats {
        ResolveStats {
            registry_fetches: self.registry_fetches.load(Ordering::Relaxed),
            listing_fetches: self.listing_fetches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}
