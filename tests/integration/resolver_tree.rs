use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use deptree::cache::{ManualClock, SledCacheStore};
use deptree::config::ResolverConfig;
use deptree::registry::{MockFailure, MockRegistry};
use deptree::resolver::{ResolveOptions, TreeResolver};
use deptree::tree::{render_text, FailureKind, RenderOptions};
use deptree::{NodeStatus, PackageKey};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const WINDOW: Duration = Duration::from_secs(3600);

/// A small slice of the real `tap@0.4.0` graph, including a cycle.
fn tap_registry() -> MockRegistry {
    MockRegistry::new()
        .with_package(
            "tap",
            "0.4.0",
            &[("inherits", "*"), ("glob", "~3.1.14"), ("yamlish", "*")],
        )
        .with_package("inherits", "1.0.2", &[])
        .with_package("inherits", "2.0.4", &[])
        .with_package("glob", "3.1.14", &[("inherits", "1"), ("minimatch", "0.2")])
        .with_package("glob", "3.1.21", &[("inherits", "1"), ("minimatch", "0.2")])
        .with_package("minimatch", "0.2.14", &[("lru-cache", "2"), ("sigmund", "~1.0.0")])
        .with_package("lru-cache", "2.7.3", &[])
        .with_package("sigmund", "1.0.1", &[])
        .with_package("yamlish", "0.0.7", &[("tap", "0.4.0")])
}

fn open_resolver(
    path: &Path,
    registry: Arc<MockRegistry>,
    clock: Arc<ManualClock>,
) -> TreeResolver {
    let cache = Arc::new(SledCacheStore::open_with_clock(path, WINDOW, clock).unwrap());
    TreeResolver::new(registry, cache, ResolverConfig::default())
}

fn start_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ))
}

#[tokio::test]
async fn resolves_full_tree_with_cycle_marker() {
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(tap_registry());
    let resolver = open_resolver(&dir.path().join("cache"), registry, start_clock());

    let tree = resolver
        .resolve(&PackageKey::new("tap", "0.4.0"))
        .await
        .unwrap();

    let expected = "\
tap@0.4.0
├── inherits@2.0.4 (*)
├── glob@3.1.21 (~3.1.14)
│   ├── inherits@1.0.2 (1)
│   └── minimatch@0.2.14 (0.2)
│       ├── lru-cache@2.7.3 (2)
│       └── sigmund@1.0.1 (~1.0.0)
└── yamlish@0.0.7 (*)
    └── tap@0.4.0 (0.4.0) [cycle]
";
    assert_eq!(render_text(&tree, RenderOptions::default()), expected);
    assert_eq!(tree.cycles().len(), 1);
    assert!(tree.errors().is_empty());
}

#[tokio::test]
async fn warm_cache_survives_restart_with_zero_registry_calls() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache");
    let clock = start_clock();
    let root = PackageKey::new("tap", "0.4.0");

    let first = {
        let registry = Arc::new(tap_registry());
        let resolver = open_resolver(&path, registry.clone(), clock.clone());
        let tree = resolver.resolve(&root).await.unwrap();
        assert!(registry.total_calls() > 0);
        tree
    };

    clock.advance(ChronoDuration::minutes(30));
    let registry = Arc::new(tap_registry());
    let resolver = open_resolver(&path, registry.clone(), clock.clone());
    let second = resolver.resolve(&root).await.unwrap();

    assert_eq!(second, first);
    assert_eq!(registry.total_calls(), 0);
    assert_eq!(resolver.stats().registry_calls(), 0);
}

#[tokio::test]
async fn expired_cache_refetches_each_package_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache");
    let clock = start_clock();
    let root = PackageKey::new("tap", "0.4.0");

    {
        let resolver = open_resolver(&path, Arc::new(tap_registry()), clock.clone());
        resolver.resolve(&root).await.unwrap();
    }

    clock.advance(ChronoDuration::hours(2));
    let registry = Arc::new(tap_registry());
    let resolver = open_resolver(&path, registry.clone(), clock.clone());
    resolver.resolve(&root).await.unwrap();

    assert_eq!(registry.fetches_of(&root), 1);
    assert_eq!(registry.fetches_of(&PackageKey::new("glob", "3.1.21")), 1);
    assert_eq!(registry.fetches_of(&PackageKey::new("inherits", "1.0.2")), 1);
    assert_eq!(registry.fetches_of(&PackageKey::new("glob", "3.1.14")), 0);
}

#[tokio::test]
async fn broken_dependency_is_reported_in_place() {
    let dir = TempDir::new().unwrap();
    let registry = tap_registry();
    registry.fail_fetch("minimatch", "0.2.14", MockFailure::Transport);
    let resolver = open_resolver(&dir.path().join("cache"), Arc::new(registry), start_clock());

    let tree = resolver
        .resolve(&PackageKey::new("tap", "0.4.0"))
        .await
        .unwrap();

    let glob = tree.child("glob").unwrap();
    let minimatch = glob.child("minimatch").unwrap();
    assert!(minimatch.children.is_empty());
    assert_eq!(minimatch.failure().unwrap().kind, FailureKind::Transport);
    assert_eq!(tree.errors().len(), 1);

    // Siblings are unaffected
    assert_eq!(glob.child("inherits").unwrap().status, NodeStatus::Resolved);
    assert_eq!(tree.child("yamlish").unwrap().children.len(), 1);
}

#[tokio::test]
async fn unknown_root_is_an_error() {
    let dir = TempDir::new().unwrap();
    let resolver = open_resolver(&dir.path().join("cache"), Arc::new(tap_registry()), start_clock());

    let err = resolver
        .resolve(&PackageKey::new("nonexistent-pkg-xyz", "1.0.0"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = resolver
        .resolve_spec("tap", Some("^9.0.0"), ResolveOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
