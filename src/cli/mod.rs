//! Command-line interface: argument parsing and command dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use std::path::PathBuf;

use crate::config::Settings;

/// Pick the directory to operate on: CLI argument, then `root` from settings,
/// then the current directory.
pub fn resolve_root(cli_root: Option<PathBuf>, settings: &Settings) -> PathBuf {
    cli_root
        .or_else(|| settings.root.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}
