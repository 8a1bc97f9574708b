//! File watcher turning filesystem notifications into change events.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (recursive, canonical root)
//!         |  raw notify::Event (bounded channel)
//!         v
//! DocumentWatcher loop
//!   - classify(): EventKind -> RawChange
//!   - ChangeTracker: KnownPaths + Debouncer -> ChangeEvent
//!         |  ChangeEvent (mpsc channel)
//!         v
//! broadcast::spawn_pump -> Broadcaster -> client connections
//! ```
//!
//! Only paths passing the indexer's [`DocumentFilter`](crate::filter::DocumentFilter)
//! produce events, so the watcher and the tree listing agree on the document set.

mod debouncer;
mod document;
mod error;
mod registry;
mod tracker;

pub use debouncer::Debouncer;
pub use document::{DocumentWatcher, DocumentWatcherBuilder, WatchHandle};
pub use error::WatchError;
pub use registry::KnownPaths;
pub use tracker::{ChangeTracker, DiskSnapshot, Presence, RawChange, Step, classify};
