use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use deptree::cache::{CacheLookup, CacheStore, ManualClock, SledCacheStore};
use deptree::{Dependency, PackageKey, PackageRecord, VersionListing};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const WINDOW: Duration = Duration::from_secs(3600);

fn record(name: &str, version: &str, deps: &[(&str, &str)]) -> PackageRecord {
    let mut record = PackageRecord::new(
        PackageKey::new(name, version),
        deps.iter().map(|(n, r)| Dependency::new(*n, *r)).collect(),
    );
    record.created_at = Some(Utc.with_ymd_and_hms(2013, 2, 20, 18, 10, 42).unwrap());
    record
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache");
    let stored = {
        let cache = SledCacheStore::open(&path, WINDOW).unwrap();
        let stored = cache
            .put(&record("tap", "0.4.0", &[("inherits", "*"), ("glob", "~3.1.14")]))
            .unwrap();
        cache.close().unwrap();
        stored
    };

    let cache = SledCacheStore::open(&path, WINDOW).unwrap();
    let loaded = cache.get(&PackageKey::new("tap", "0.4.0")).unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(loaded.dependency_names(), vec!["inherits", "glob"]);
    assert_eq!(cache.len(), 1);
}

#[test]
fn listings_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache");
    {
        let cache = SledCacheStore::open(&path, WINDOW).unwrap();
        cache
            .put_listing(
                &VersionListing::new("glob", vec!["3.1.14".into(), "3.1.21".into()])
                    .with_tag("latest", "3.1.21"),
            )
            .unwrap();
        cache.close().unwrap();
    }

    let cache = SledCacheStore::open(&path, WINDOW).unwrap();
    let listing = cache.get_listing("glob").unwrap().unwrap();
    assert_eq!(listing.versions.len(), 2);
    assert_eq!(listing.dist_tags.get("latest").map(String::as_str), Some("3.1.21"));
}

#[test]
fn freshness_follows_the_clock_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache");
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let key = PackageKey::new("inherits", "1.0.2");

    {
        let cache = SledCacheStore::open_with_clock(&path, WINDOW, clock.clone()).unwrap();
        cache.put(&record("inherits", "1.0.2", &[])).unwrap();
        cache.close().unwrap();
    }

    clock.advance(ChronoDuration::minutes(59));
    let cache = SledCacheStore::open_with_clock(&path, WINDOW, clock.clone()).unwrap();
    assert!(cache.get(&key).unwrap().is_some());

    clock.advance(ChronoDuration::minutes(2));
    assert!(cache.get(&key).unwrap().is_none());
    assert!(matches!(cache.lookup(&key).unwrap(), CacheLookup::Stale(_)));

    assert_eq!(cache.prune_stale().unwrap(), 1);
    assert!(matches!(cache.lookup(&key).unwrap(), CacheLookup::Absent));
}

#[test]
fn overwrite_keeps_one_entry_per_key() {
    let dir = TempDir::new().unwrap();
    let cache = SledCacheStore::open(&dir.path().join("cache"), WINDOW).unwrap();
    cache.put(&record("glob", "3.1.21", &[("inherits", "1")])).unwrap();
    cache
        .put(&record("glob", "3.1.21", &[("inherits", "2"), ("minimatch", "0.2")]))
        .unwrap();

    let entries = cache.all_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].dependencies.len(), 2);
}
