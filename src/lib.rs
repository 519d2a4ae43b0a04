//! deptree: Transitive Dependency Tree Resolution
//!
//! Resolves the full dependency tree of a package published to an npm-style
//! registry. Package metadata is cached durably on disk, so re-resolving a
//! tree within the freshness window costs no registry calls.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod resolver;
pub mod tooling;
pub mod tree;
pub mod types;

pub use cache::{CacheLookup, CacheStore, SledCacheStore};
pub use error::{ApiError, RangeError, RegistryError, StorageError};
pub use registry::{MockRegistry, NpmRegistryClient, RegistryClient};
pub use resolver::{ResolveOptions, ResolveStats, TreeResolver};
pub use tree::{NodeStatus, TreeNode};
pub use types::{Dependency, PackageKey, PackageRecord, VersionListing};
