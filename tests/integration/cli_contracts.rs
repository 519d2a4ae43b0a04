use clap::Parser;
use deptree::config::{CacheConfig, DeptreeConfig};
use deptree::registry::MockRegistry;
use deptree::tooling::cli::{CacheCommands, Cli, CliContext, Commands};
use std::sync::Arc;
use tempfile::TempDir;

fn registry() -> Arc<MockRegistry> {
    Arc::new(
        MockRegistry::new()
            .with_package("tap", "0.4.0", &[("inherits", "*"), ("glob", "~3.1.14")])
            .with_package("tap", "0.4.1", &[("inherits", "*")])
            .with_package("glob", "3.1.21", &[("inherits", "1")])
            .with_package("inherits", "1.0.2", &[])
            .with_package("inherits", "2.0.4", &[]),
    )
}

fn context(dir: &TempDir, registry: Arc<MockRegistry>) -> CliContext {
    let config = DeptreeConfig {
        cache: CacheConfig {
            path: Some(dir.path().join("cache")),
            freshness_secs: 3600,
        },
        ..DeptreeConfig::default()
    };
    CliContext::from_config(config).unwrap().with_registry(registry)
}

fn parse(args: &[&str]) -> Commands {
    Cli::try_parse_from(args).unwrap().command
}

#[test]
fn resolve_arguments_parse() {
    match parse(&["deptree", "resolve", "tap@0.4.0", "--format", "json", "--max-depth", "2", "--dev"]) {
        Commands::Resolve {
            name,
            version,
            format,
            dev,
            max_depth,
            refresh,
            ..
        } => {
            assert_eq!(name, "tap@0.4.0");
            assert_eq!(version, None);
            assert_eq!(format, "json");
            assert!(dev);
            assert_eq!(max_depth, Some(2));
            assert!(!refresh);
        }
        _ => panic!("expected resolve command"),
    }
}

#[test]
fn resolve_json_contract_has_required_fields() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, registry());
    let output = cli
        .execute(&parse(&["deptree", "resolve", "tap", "0.4.0", "--format", "json"]))
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["key"]["name"], "tap");
    assert_eq!(parsed["key"]["version"], "0.4.0");
    assert!(parsed["requested"].is_null());
    assert_eq!(parsed["status"], "resolved");

    let children = parsed["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["key"]["version"], "2.0.4");
    assert_eq!(children[0]["requested"]["range"], "*");
    assert_eq!(children[1]["children"][0]["key"]["version"], "1.0.2");
}

#[test]
fn resolve_without_version_uses_latest() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, registry());
    let output = cli
        .execute(&parse(&["deptree", "resolve", "tap", "--no-color"]))
        .unwrap();
    assert!(output.starts_with("tap@0.4.1\n"));
}

#[test]
fn max_depth_marks_truncated_nodes() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, registry());
    let output = cli
        .execute(&parse(&[
            "deptree", "resolve", "tap@0.4.0", "--max-depth", "1", "--no-color",
        ]))
        .unwrap();
    assert!(output.contains("├── inherits@2.0.4 (*)\n"));
    assert!(output.contains("└── glob@3.1.21 (~3.1.14) [truncated]\n"));
}

#[test]
fn unknown_root_fails_the_command() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, registry());
    let err = cli
        .execute(&parse(&["deptree", "resolve", "nonexistent-pkg-xyz", "1.0.0"]))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn second_resolve_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let registry = registry();
    let cli = context(&dir, registry.clone());
    let command = parse(&["deptree", "resolve", "tap@0.4.0", "--no-color"]);

    let first = cli.execute(&command).unwrap();
    let calls = registry.total_calls();
    let second = cli.execute(&command).unwrap();

    assert_eq!(first, second);
    assert_eq!(registry.total_calls(), calls);
}

#[test]
fn cache_prune_and_path() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, registry());
    cli.execute(&parse(&["deptree", "resolve", "tap@0.4.0"]))
        .unwrap();

    let output = cli
        .execute(&Commands::Cache {
            command: CacheCommands::Prune,
        })
        .unwrap();
    assert_eq!(output, "Removed 0 stale cache entries.");

    let path = cli
        .execute(&Commands::Cache {
            command: CacheCommands::Path,
        })
        .unwrap();
    assert_eq!(path, dir.path().join("cache").display().to_string());

    let table = cli
        .execute(&Commands::Cache {
            command: CacheCommands::List {
                format: "text".to_string(),
            },
        })
        .unwrap();
    assert!(table.contains("glob"));
    assert!(table.ends_with("4 cached packages"));
}
