//! Dependency Tree Resolver
//!
//! Expands a root package into its full transitive dependency tree. Records
//! come from the Cache Store when fresh and from the registry otherwise; every
//! registry result is written back to the cache.
//!
//! Cycle handling is local: each recursive step carries the set of keys on the
//! path from the root, and an edge back into that set becomes a `Cycle` leaf.
//! Failures below the root are recorded on the failing node and do not affect
//! siblings. Only root failures abort a resolution.

pub mod stats;

use crate::cache::CacheStore;
use crate::config::ResolverConfig;
use crate::error::{ApiError, RegistryError};
use crate::registry::{range, RegistryClient};
use crate::tree::{NodeStatus, ResolutionFailure, TreeNode};
use crate::types::{is_concrete_version, Dependency, PackageKey, PackageRecord, VersionListing};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

pub use stats::ResolveStats;
use stats::Counters;

/// Keys on the path from the root to the node being expanded.
type AncestorPath = Arc<HashSet<PackageKey>>;

/// Per-request options
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Skip cache reads; fetched records are still written back.
    pub refresh: bool,
    /// Use the root's devDependencies when it declares no dependencies.
    pub include_dev: bool,
}

pub struct TreeResolver {
    registry: Arc<dyn RegistryClient>,
    cache: Arc<dyn CacheStore>,
    config: ResolverConfig,
    /// Bounds in-flight registry requests across all subtrees.
    permits: Semaphore,
    counters: Counters,
}

impl TreeResolver {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        cache: Arc<dyn CacheStore>,
        config: ResolverConfig,
    ) -> Self {
        let concurrency = config.concurrency.max(1);
        Self {
            registry,
            cache,
            config,
            permits: Semaphore::new(concurrency),
            counters: Counters::default(),
        }
    }

    /// Cumulative counters for every resolution run by this resolver.
    pub fn stats(&self) -> ResolveStats {
        self.counters.snapshot()
    }

    /// Resolve the tree rooted at a concrete package version.
    pub async fn resolve(&self, root: &PackageKey) -> Result<TreeNode, ApiError> {
        self.resolve_with(root, ResolveOptions::default()).await
    }

    /// Resolve `name` at `spec` (a version, range or dist-tag; `None` means `latest`).
    pub async fn resolve_spec(
        &self,
        name: &str,
        spec: Option<&str>,
        options: ResolveOptions,
    ) -> Result<TreeNode, ApiError> {
        let root = self.root_key(name, spec, options.refresh).await?;
        self.resolve_with(&root, options).await
    }

    /// Pick the concrete root version for `spec`.
    pub async fn root_key(
        &self,
        name: &str,
        spec: Option<&str>,
        refresh: bool,
    ) -> Result<PackageKey, ApiError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidKey("package name cannot be empty".to_string()).into());
        }
        self.concrete_key(name, spec.unwrap_or("latest"), refresh).await
    }

    pub async fn resolve_with(
        &self,
        root: &PackageKey,
        options: ResolveOptions,
    ) -> Result<TreeNode, ApiError> {
        root.validate()?;
        let root = &root.normalized();
        let started = Instant::now();
        info!(root = %root, refresh = options.refresh, "Resolving dependency tree");

        let record = self.load_record(root, options.refresh).await?;
        let mut edges = record.dependencies;
        if options.include_dev && edges.is_empty() {
            edges = record.dev_dependencies;
        }

        let tree = if edges.is_empty() {
            TreeNode::resolved(root.clone(), None, Vec::new())
        } else if self.config.max_depth == Some(0) {
            TreeNode::marker(root.clone(), None, NodeStatus::Truncated)
        } else {
            let path: AncestorPath = Arc::new(HashSet::from([root.clone()]));
            let children = self.resolve_children(edges, path, 1, options).await;
            TreeNode::resolved(root.clone(), None, children)
        };

        let stats = self.stats();
        info!(
            root = %root,
            nodes = tree.node_count(),
            depth = tree.depth(),
            cycles = tree.cycles().len(),
            errors = tree.errors().len(),
            registry_fetches = stats.registry_fetches,
            listing_fetches = stats.listing_fetches,
            cache_hits = stats.cache_hits,
            duration_ms = started.elapsed().as_millis() as u64,
            "Resolved dependency tree"
        );
        Ok(tree)
    }

    /// Resolve sibling subtrees concurrently, keeping declaration order.
    async fn resolve_children(
        &self,
        edges: Vec<Dependency>,
        path: AncestorPath,
        depth: usize,
        options: ResolveOptions,
    ) -> Vec<TreeNode> {
        stream::iter(
            edges
                .into_iter()
                .map(|dep| self.resolve_child(dep, Arc::clone(&path), depth, options)),
        )
        .buffered(self.config.concurrency.max(1))
        .collect()
        .await
    }

    fn resolve_child(
        &self,
        dep: Dependency,
        path: AncestorPath,
        depth: usize,
        options: ResolveOptions,
    ) -> BoxFuture<'_, TreeNode> {
        async move {
            let key = match self.concrete_key(&dep.name, &dep.range, options.refresh).await {
                Ok(key) => key,
                Err(e) => {
                    warn!(dependency = %dep.name, range = %dep.range, "Failed to resolve version: {}", e);
                    let unresolved = PackageKey::new(dep.name.clone(), dep.range.clone());
                    return TreeNode::failed(unresolved, Some(dep), ResolutionFailure::from(&e));
                }
            };

            if path.contains(&key) {
                debug!(key = %key, "Cycle detected, not expanding");
                return TreeNode::marker(key, Some(dep), NodeStatus::Cycle);
            }

            let record = match self.load_record(&key, options.refresh).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(key = %key, "Failed to fetch dependency: {}", e);
                    return TreeNode::failed(key, Some(dep), ResolutionFailure::from(&e));
                }
            };

            if record.dependencies.is_empty() {
                return TreeNode::resolved(key, Some(dep), Vec::new());
            }
            if self.config.max_depth.map_or(false, |max| depth >= max) {
                return TreeNode::marker(key, Some(dep), NodeStatus::Truncated);
            }

            let mut child_path = HashSet::clone(&path);
            child_path.insert(key.clone());
            let children = self
                .resolve_children(record.dependencies, Arc::new(child_path), depth + 1, options)
                .await;
            TreeNode::resolved(key, Some(dep), children)
        }
        .boxed()
    }

    /// Turn a declared spec into a concrete key. Exact versions skip the listing.
    async fn concrete_key(
        &self,
        name: &str,
        spec: &str,
        refresh: bool,
    ) -> Result<PackageKey, ApiError> {
        let (target, target_spec) = range::split_alias(name, spec);
        if is_concrete_version(&target_spec) {
            return Ok(PackageKey::new(target, target_spec).normalized());
        }
        let listing = self.load_listing(&target, refresh).await?;
        let version = range::select_version(&listing, &target_spec)?;
        Ok(PackageKey::new(target, version))
    }

    async fn load_record(
        &self,
        key: &PackageKey,
        refresh: bool,
    ) -> Result<PackageRecord, RegistryError> {
        if !refresh {
            match self.cache.get(key) {
                Ok(Some(record)) => {
                    self.counters.hit();
                    return Ok(record);
                }
                Ok(None) => self.counters.miss(),
                Err(e) => {
                    self.counters.miss();
                    warn!(key = %key, "Cache read failed, falling back to registry: {}", e);
                }
            }
        }

        let record = {
            let _permit = self.acquire().await?;
            self.counters.registry_fetch();
            debug!(key = %key, "Fetching from registry");
            self.registry.fetch(key).await?
        };

        match self.cache.put(&record) {
            Ok(stored) => Ok(stored),
            Err(e) => {
                warn!(key = %key, "Cache write failed: {}", e);
                Ok(record)
            }
        }
    }

    async fn load_listing(&self, name: &str, refresh: bool) -> Result<VersionListing, RegistryError> {
        if !refresh {
            match self.cache.get_listing(name) {
                Ok(Some(listing)) => {
                    self.counters.hit();
                    return Ok(listing);
                }
                Ok(None) => self.counters.miss(),
                Err(e) => {
                    self.counters.miss();
                    warn!(package = name, "Cache read failed, falling back to registry: {}", e);
                }
            }
        }

        let listing = {
            let _permit = self.acquire().await?;
            self.counters.listing_fetch();
            debug!(package = name, "Fetching version listing");
            self.registry.versions(name).await?
        };

        match self.cache.put_listing(&listing) {
            Ok(stored) => Ok(stored),
            Err(e) => {
                warn!(package = name, "Cache write failed: {}", e);
                Ok(listing)
            }
        }
    }

    async fn acquire(&self) -> Result<tokio::sync::SemaphorePermit<'_>, RegistryError> {
        self.permits
            .acquire()
            .await
            .map_err(|_| RegistryError::Transport("registry request limiter closed".to_string()))
    }
}
