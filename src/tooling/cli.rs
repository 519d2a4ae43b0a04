//! CLI Tooling
//!
//! Command-line interface for resolving dependency trees and maintaining the
//! local package cache.

use crate::cache::{CacheLookup, CacheStore, SledCacheStore};
use crate::config::{ConfigLoader, DeptreeConfig};
use crate::error::ApiError;
use crate::registry::{NpmRegistryClient, RegistryClient};
use crate::resolver::{ResolveOptions, TreeResolver};
use crate::tree::{render_json, render_text, RenderOptions};
use crate::types::{PackageKey, PackageRecord};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// deptree - Resolve the transitive dependency tree of a registry package
#[derive(Parser)]
#[command(name = "deptree")]
#[command(about = "Resolve and display the transitive dependency tree of a registry package")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve and print the dependency tree of a package
    Resolve {
        /// Package name, optionally as name@version
        name: String,
        /// Version, range or dist-tag (default: latest)
        version: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Use the root's devDependencies when it declares no dependencies
        #[arg(long)]
        dev: bool,
        /// Stop expanding below this depth
        #[arg(long)]
        max_depth: Option<usize>,
        /// Ignore cached entries and refetch everything
        #[arg(long)]
        refresh: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Inspect and maintain the package cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cached package records
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one cached record
    Show {
        name: String,
        version: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Remove entries older than the freshness window
    Prune,
    /// Remove every cached entry
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Print the cache directory
    Path,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}

/// CLI context holding the effective configuration
pub struct CliContext {
    config: DeptreeConfig,
    cache_path: PathBuf,
    /// Registry override; the npm client is built from config when unset
    registry: Option<Arc<dyn RegistryClient>>,
}

impl CliContext {
    /// Load configuration and fold CLI logging flags into it.
    pub fn new(cli: &Cli) -> Result<Self, ApiError> {
        let mut config = ConfigLoader::load_optional(cli.config.as_deref())?;

        if cli.verbose {
            config.logging.level = "debug".to_string();
        }
        if let Some(level) = &cli.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &cli.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &cli.log_file {
            config.logging.file = Some(file.clone());
        }

        Self::from_config(config)
    }

    pub fn from_config(config: DeptreeConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let cache_path = config.cache.resolve_path()?;
        Ok(Self {
            config,
            cache_path,
            registry: None,
        })
    }

    /// Use `registry` instead of the configured npm endpoint.
    pub fn with_registry(mut self, registry: Arc<dyn RegistryClient>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &DeptreeConfig {
        &self.config
    }

    pub fn cache_path(&self) -> &PathBuf {
        &self.cache_path
    }

    fn open_cache(&self) -> Result<SledCacheStore, ApiError> {
        Ok(SledCacheStore::open(
            &self.cache_path,
            self.config.cache.freshness_window(),
        )?)
    }

    fn registry(&self) -> Result<Arc<dyn RegistryClient>, ApiError> {
        match &self.registry {
            Some(registry) => Ok(Arc::clone(registry)),
            None => Ok(Arc::new(NpmRegistryClient::new(&self.config.registry)?)),
        }
    }

    /// Execute a CLI command, returning the text to print.
    ///
    /// `resolve` drives the async resolver on a runtime built for the call,
    /// so this must be called from synchronous code. Calling it from inside a
    /// tokio runtime panics; async callers should use [`TreeResolver`]
    /// directly.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Resolve {
                name,
                version,
                format,
                dev,
                max_depth,
                refresh,
                no_color,
            } => {
                let (name, version) = split_package_arg(name, version.as_deref());
                let options = ResolveOptions {
                    refresh: *refresh,
                    include_dev: *dev,
                };
                let color = !*no_color && std::io::stdout().is_terminal();
                self.handle_resolve(&name, version.as_deref(), format, *max_depth, options, color)
            }
            Commands::Cache { command } => self.handle_cache_command(command),
            Commands::Config { command } => match command {
                ConfigCommands::Show => toml::to_string_pretty(&self.config).map_err(|e| {
                    ApiError::Serialization(format!("Failed to serialize config: {}", e))
                }),
            },
        }
    }

    fn handle_resolve(
        &self,
        name: &str,
        version: Option<&str>,
        format: &str,
        max_depth: Option<usize>,
        options: ResolveOptions,
        color: bool,
    ) -> Result<String, ApiError> {
        check_format(format)?;

        let cache: Arc<dyn CacheStore> = Arc::new(self.open_cache()?);
        let mut resolver_config = self.config.resolver.clone();
        if max_depth.is_some() {
            resolver_config.max_depth = max_depth;
        }
        let resolver = TreeResolver::new(self.registry()?, cache, resolver_config);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;
        let tree = rt.block_on(resolver.resolve_spec(name, version, options))?;

        let stats = resolver.stats();
        info!(
            registry_calls = stats.registry_calls(),
            cache_hits = stats.cache_hits,
            "Resolve command finished"
        );

        if format == "json" {
            render_json(&tree)
        } else {
            Ok(render_text(&tree, RenderOptions { color }))
        }
    }

    fn handle_cache_command(&self, command: &CacheCommands) -> Result<String, ApiError> {
        match command {
            CacheCommands::List { format } => {
                check_format(format)?;
                let cache = self.open_cache()?;
                let entries = cache.all_entries()?;
                if format == "json" {
                    return serde_json::to_string_pretty(&entries).map_err(|e| {
                        ApiError::Serialization(format!("Failed to serialize entries: {}", e))
                    });
                }
                if entries.is_empty() {
                    return Ok("Cache is empty.".to_string());
                }
                let rows = entries
                    .into_iter()
                    .map(|record| {
                        let state = match cache.lookup(&record.key)? {
                            CacheLookup::Fresh(_) => "fresh",
                            _ => "stale",
                        };
                        Ok((record, state))
                    })
                    .collect::<Result<Vec<_>, ApiError>>()?;
                Ok(format_cache_table(&rows))
            }
            CacheCommands::Show {
                name,
                version,
                format,
            } => {
                check_format(format)?;
                let cache = self.open_cache()?;
                let key = PackageKey::new(name.clone(), version.clone());
                let (record, state) = match cache.lookup(&key)? {
                    CacheLookup::Fresh(record) => (record, "fresh"),
                    CacheLookup::Stale(record) => (record, "stale"),
                    CacheLookup::Absent => return Ok(format!("{} is not cached.", key)),
                };
                if format == "json" {
                    serde_json::to_string_pretty(&record).map_err(|e| {
                        ApiError::Serialization(format!("Failed to serialize record: {}", e))
                    })
                } else {
                    Ok(format_record_text(&record, state))
                }
            }
            CacheCommands::Prune => {
                let cache = self.open_cache()?;
                let removed = cache.prune_stale()?;
                Ok(format!("Removed {} stale cache entries.", removed))
            }
            CacheCommands::Clear { force } => {
                if !*force {
                    let confirmed = dialoguer::Confirm::new()
                        .with_prompt(format!(
                            "Remove every entry from {}?",
                            self.cache_path.display()
                        ))
                        .default(false)
                        .interact()
                        .map_err(|e| ApiError::ConfigError(format!("Prompt failed: {}", e)))?;
                    if !confirmed {
                        return Ok("Cancelled.".to_string());
                    }
                }
                let cache = self.open_cache()?;
                let removed = cache.clear()?;
                Ok(format!("Removed {} cached packages.", removed))
            }
            CacheCommands::Path => Ok(self.cache_path.display().to_string()),
        }
    }
}

/// Accept `name@version` in the name argument when no version is given.
/// A leading `@` belongs to a scope, not a version separator.
pub fn split_package_arg(name: &str, version: Option<&str>) -> (String, Option<String>) {
    if let Some(version) = version {
        return (name.to_string(), Some(version.to_string()));
    }
    match name.rfind('@') {
        Some(idx) if idx > 0 => (
            name[..idx].to_string(),
            Some(name[idx + 1..].to_string()).filter(|v| !v.is_empty()),
        ),
        _ => (name.to_string(), None),
    }
}

fn check_format(format: &str) -> Result<(), ApiError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(ApiError::ConfigError(format!(
            "Invalid output format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

fn format_timestamp(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_cache_table(rows: &[(PackageRecord, &str)]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Package", "Version", "Deps", "Published", "Fetched", "State"]);
    for (record, state) in rows {
        table.add_row(vec![
            record.key.name.clone(),
            record.key.version.clone(),
            record.dependencies.len().to_string(),
            format_timestamp(record.created_at),
            format_timestamp(Some(record.fetched_at)),
            state.to_string(),
        ]);
    }
    format!("{}\n{} cached packages", table, rows.len())
}

fn format_record_text(record: &PackageRecord, state: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", record.key, state));
    out.push_str(&format!("  published: {}\n", format_timestamp(record.created_at)));
    out.push_str(&format!("  fetched:   {}\n", format_timestamp(Some(record.fetched_at))));
    if record.dependencies.is_empty() {
        out.push_str("  dependencies: none\n");
    } else {
        out.push_str("  dependencies:\n");
        for dep in &record.dependencies {
            out.push_str(&format!("    {} {}\n", dep.name, dep.range));
        }
    }
    if !record.dev_dependencies.is_empty() {
        out.push_str("  devDependencies:\n");
        for dep in &record.dev_dependencies {
            out.push_str(&format!("    {} {}\n", dep.name, dep.range));
        }
    }
    out
}
