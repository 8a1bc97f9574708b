//! Configuration module for the document server.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `MDVIEW_` and use double
//! underscores to separate nested levels:
//! - `MDVIEW_SERVER__BIND=0.0.0.0:8080` sets `server.bind`
//! - `MDVIEW_FILE_WATCH__DEBOUNCE_MS=250` sets `file_watch.debounce_ms`
//! - `MDVIEW_DOCUMENTS__RESPECT_GITIGNORE=true` sets `documents.respect_gitignore`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::filter::DocumentFilter;

/// Directory holding the workspace settings file.
pub const CONFIG_DIR: &str = ".mdview";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MDVIEW_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory to serve (CLI argument takes precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Which files count as documents
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Live change notifications
    #[serde(default)]
    pub file_watch: FileWatchConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Built front-end bundle served for non-API routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    /// Outbound queue depth per WebSocket client
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,

    /// Allow cross-origin requests (for front-end dev servers)
    #[serde(default)]
    pub cors: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DocumentsConfig {
    /// Tracked file extensions, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Skip files excluded by .gitignore
    #[serde(default)]
    pub respect_gitignore: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FileWatchConfig {
    /// Push change notifications to connected clients
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Quiet period before a content change is announced (0 = immediately)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides (module -> level)
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_bind() -> String {
    "127.0.0.1:3456".to_string()
}
fn default_client_buffer() -> usize {
    256
}
fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "markdown".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_debounce_ms() -> u64 {
    100
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            root: None,
            server: ServerConfig::default(),
            documents: DocumentsConfig::default(),
            file_watch: FileWatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: None,
            client_buffer: default_client_buffer(),
            cors: false,
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            respect_gitignore: false,
        }
    }
}

impl Default for FileWatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl DocumentsConfig {
    /// Build the match rule from the configured extensions.
    pub fn filter(&self) -> DocumentFilter {
        DocumentFilter::new(&self.extensions)
    }
}

impl Settings {
    /// Load configuration from all sources.
    ///
    /// Uses the nearest `.mdview/settings.toml` above the current directory
    /// if there is one.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file (plus defaults and environment).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            // Double underscore separates nesting; single underscores stay in field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the nearest settings file, searching from the current directory up.
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR).join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Save current configuration to file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write a default settings file under `dir`.
    pub fn init_config_file(
        dir: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
