//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Serve a directory of markdown documents with live reload
#[derive(Parser, Debug)]
#[command(
    name = "mdview",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serve a directory of markdown documents with live reload",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  mdview serve ./notes\n  mdview serve --bind 0.0.0.0:8080 --no-watch\n  mdview tree ./notes --json\n  mdview init"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true, env = "MDVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve documents over HTTP
    #[command(about = "Start the document server")]
    Serve {
        /// Directory to serve (defaults to `root` from settings, then the current directory)
        #[arg(value_name = "ROOT")]
        root: Option<PathBuf>,

        /// Address to listen on (overrides config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Disable live change notifications
        #[arg(long)]
        no_watch: bool,

        /// Front-end bundle to serve for non-API routes
        #[arg(long, value_name = "DIR")]
        static_dir: Option<PathBuf>,
    },

    /// Print the discovered document tree
    #[command(about = "Print the document tree")]
    Tree {
        /// Directory to scan
        #[arg(value_name = "ROOT")]
        root: Option<PathBuf>,

        /// Output the tree as JSON (same shape as /api/files)
        #[arg(long)]
        json: bool,
    },

    /// Initialize project
    #[command(about = "Write .mdview/settings.toml with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display the effective settings")]
    Config,
}
