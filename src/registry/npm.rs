//! npm registry client
//!
//! Reads the full package document (`GET {endpoint}/{name}`) and normalizes the
//! requested version into a [`PackageRecord`].

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::registry::RegistryClient;
use crate::types::{Dependency, PackageKey, PackageRecord, VersionListing};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Package document as served by the registry. Only the fields we read.
#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    versions: Map<String, Value>,
    #[serde(default)]
    time: Map<String, Value>,
}

/// HTTP client for an npm-compatible registry.
pub struct NpmRegistryClient {
    http: reqwest::Client,
    endpoint: String,
}

impl NpmRegistryClient {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("deptree/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn packument_url(&self, name: &str) -> String {
        format!("{}/{}", self.endpoint, encode_name(name))
    }

    /// Fetch the package document. `version` is only used to label a 404.
    async fn get_packument(&self, name: &str, version: &str) -> Result<Packument, RegistryError> {
        let url = self.packument_url(name);
        debug!(url = %url, "GET package document");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::not_found(name, version));
        }
        if !status.is_success() {
            return Err(RegistryError::Transport(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        response
            .json::<Packument>()
            .await
            .map_err(|e| RegistryError::Decode(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl RegistryClient for NpmRegistryClient {
    async fn fetch(&self, key: &PackageKey) -> Result<PackageRecord, RegistryError> {
        key.validate()?;
        let key = &key.normalized();
        let packument = self.get_packument(&key.name, &key.version).await?;

        let doc = packument
            .versions
            .get(&key.version)
            .ok_or_else(|| RegistryError::not_found(&key.name, &key.version))?;

        let created_at = packument
            .time
            .get(&key.version)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc));

        Ok(PackageRecord {
            key: key.clone(),
            dependencies: dependency_list(doc.get("dependencies")),
            dev_dependencies: dependency_list(doc.get("devDependencies")),
            created_at,
            fetched_at: Utc::now(),
        })
    }

    async fn versions(&self, name: &str) -> Result<VersionListing, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidKey(
                "package name cannot be empty".to_string(),
            ));
        }
        let packument = self.get_packument(name, "*").await?;
        Ok(VersionListing {
            name: name.to_string(),
            versions: packument.versions.keys().cloned().collect(),
            dist_tags: packument.dist_tags,
            fetched_at: Utc::now(),
        })
    }
}

/// Scoped names travel with the scope separator percent-encoded.
fn encode_name(name: &str) -> String {
    name.replace('/', "%2F")
}

/// Flatten a dependency object, keeping the registry's declaration order.
///
/// Old documents occasionally carry non-string ranges; those are kept as their
/// JSON text so the edge is still visible.
fn dependency_list(value: Option<&Value>) -> Vec<Dependency> {
    let Some(Value::Object(map)) = value else {
        return Vec::new();
    };
    map.iter()
        .map(|(name, range)| {
            let range = match range {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Dependency::new(name.clone(), range)
        })
        .collect()
}
