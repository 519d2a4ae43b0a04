//! Command-line surface
//!
//! Argument parsing and command dispatch for the `deptree` binary.

pub mod cli;

pub use cli::{CacheCommands, Cli, CliContext, Commands, ConfigCommands};
