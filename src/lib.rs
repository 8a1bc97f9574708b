//! Serve a directory of markdown documents over HTTP with live change
//! notifications.
//!
//! The pieces, bottom-up:
//! - [`sandbox::PathGuard`] keeps every client path inside the root
//! - [`tree::TreeIndexer`] discovers documents and builds the [`FileNode`] tree
//! - [`content::ContentAccessor`] reads documents and assets
//! - [`watcher::DocumentWatcher`] turns filesystem events into [`ChangeEvent`]s
//! - [`broadcast::Broadcaster`] fans events out to WebSocket clients
//! - [`server`] ties them together behind an axum router

pub mod broadcast;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod filter;
pub mod logging;
pub mod sandbox;
pub mod server;
pub mod tree;
pub mod watcher;

pub use broadcast::{Broadcaster, ConnectionId, Subscription};
pub use config::Settings;
pub use content::{Asset, ContentAccessor, FileContent};
pub use error::{DocumentError, DocumentResult};
pub use events::ChangeEvent;
pub use filter::DocumentFilter;
pub use sandbox::{PathGuard, ResolvedPath};
pub use tree::{FileNode, NodeKind, TreeIndexer};
pub use watcher::{DocumentWatcher, WatchError, WatchHandle};
