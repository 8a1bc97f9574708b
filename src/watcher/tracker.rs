//! Normalization of raw notify events into [`ChangeEvent`]s.
//!
//! Backends report changes differently (inotify sends rename halves,
//! FSEvents sends ambiguous rename flags, some editors save by
//! replace-on-rename). Classification maps every `EventKind` onto a small
//! set of raw changes; the [`ChangeTracker`] then resolves those against
//! the known document set.
//!
//! A rename always surfaces as `Removed(old)` followed by `Added(new)`.
//!
//! The tracker itself never touches the disk. Whatever it needs to know
//! about a path is captured beforehand into a [`DiskSnapshot`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind, RenameMode};

use crate::events::ChangeEvent;
use crate::filter::DocumentFilter;
use crate::tree::{from_slash_path, to_slash_path};

use super::debouncer::Debouncer;
use super::registry::KnownPaths;

/// Backend-independent change extracted from a notify event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawChange {
    /// Path appeared (created or moved in).
    Appeared(PathBuf),
    /// Path content changed.
    Modified(PathBuf),
    /// Path disappeared (deleted or moved out).
    Vanished(PathBuf),
    /// Backend could not say; decide by checking the disk.
    Ambiguous(PathBuf),
    /// Backend dropped events; the known set must be rebuilt.
    Rescan,
}

/// Map one notify event onto raw changes.
pub fn classify(event: &notify::Event) -> Vec<RawChange> {
    if event.need_rescan() {
        return vec![RawChange::Rescan];
    }

    let each = |f: fn(PathBuf) -> RawChange| -> Vec<RawChange> {
        event.paths.iter().cloned().map(f).collect()
    };

    match event.kind {
        EventKind::Create(_) => each(RawChange::Appeared),
        EventKind::Remove(_) => each(RawChange::Vanished),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => each(RawChange::Vanished),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(RawChange::Appeared),
        // inotify also reports the From and To halves separately.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => each(RawChange::Ambiguous),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => each(RawChange::Modified),
        EventKind::Any => each(RawChange::Ambiguous),
        EventKind::Access(_) | EventKind::Other => Vec::new(),
    }
}

/// What a path pointed at when its event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Missing,
    File,
    Dir,
    /// Exists but is neither (socket, fifo, ...)
    Other,
}

/// Presence of a batch of paths, stat'ed off the event loop's hot path.
#[derive(Debug, Default)]
pub struct DiskSnapshot {
    entries: HashMap<PathBuf, Presence>,
}

impl DiskSnapshot {
    pub async fn capture(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut entries = HashMap::new();
        for path in paths {
            let presence = match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => Presence::File,
                Ok(meta) if meta.is_dir() => Presence::Dir,
                Ok(_) => Presence::Other,
                Err(_) => Presence::Missing,
            };
            entries.insert(path, presence);
        }
        Self { entries }
    }

    /// Paths not captured count as missing.
    pub fn presence(&self, path: &Path) -> Presence {
        self.entries.get(path).copied().unwrap_or(Presence::Missing)
    }

    pub fn insert(&mut self, path: PathBuf, presence: Presence) {
        self.entries.insert(path, presence);
    }
}

/// Follow-up work the watcher loop has to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deliver this event.
    Emit(ChangeEvent),
    /// A directory appeared; scan it for documents.
    ScanDir(PathBuf),
    /// Rebuild the known set from a full scan.
    Resync,
}

/// Stateful resolver from raw changes to change events.
pub struct ChangeTracker {
    root: PathBuf,
    filter: DocumentFilter,
    known: KnownPaths,
    debouncer: Debouncer,
}

impl ChangeTracker {
    pub fn new(root: PathBuf, filter: DocumentFilter, debounce_ms: u64) -> Self {
        Self {
            root,
            filter,
            known: KnownPaths::new(),
            debouncer: Debouncer::new(debounce_ms),
        }
    }

    /// Seed the known set from the priming scan. Emits nothing.
    pub fn prime(&mut self, files: impl IntoIterator<Item = String>) {
        self.known.reconcile(files);
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    pub fn has_pending(&self) -> bool {
        self.debouncer.has_pending()
    }

    /// When the next debounced change settles.
    pub fn next_deadline(&self) -> Option<std::time::Instant> {
        self.debouncer.next_deadline()
    }

    /// Resolve one notify event against `disk`, captured for `event.paths`.
    pub fn apply(&mut self, event: &notify::Event, disk: &DiskSnapshot) -> Vec<Step> {
        let mut steps = Vec::new();
        for change in classify(event) {
            self.apply_change(change, disk, &mut steps);
        }
        steps
    }

    fn apply_change(&mut self, change: RawChange, disk: &DiskSnapshot, steps: &mut Vec<Step>) {
        let path = match change {
            RawChange::Rescan => {
                steps.push(Step::Resync);
                return;
            }
            RawChange::Ambiguous(path) => {
                let change = match disk.presence(&path) {
                    Presence::Missing => RawChange::Vanished(path),
                    _ => RawChange::Appeared(path),
                };
                self.apply_change(change, disk, steps);
                return;
            }
            RawChange::Appeared(ref p) | RawChange::Modified(ref p) | RawChange::Vanished(ref p) => {
                p.clone()
            }
        };

        let Some(relative) = self.relative(&path) else {
            return;
        };
        if relative.is_empty() || DocumentFilter::is_hidden(Path::new(&relative)) {
            return;
        }
        let tracked = self.filter.has_tracked_extension(Path::new(&relative));
        let presence = disk.presence(&path);

        match change {
            RawChange::Appeared(_) if tracked => {
                if presence == Presence::Dir {
                    steps.push(Step::ScanDir(path));
                } else if self.known.insert(&relative) {
                    steps.push(Step::Emit(ChangeEvent::added(relative)));
                } else {
                    // Replaced in place (e.g. atomic save via rename).
                    self.record_change(relative, steps);
                }
            }
            RawChange::Appeared(_) => {
                if presence == Presence::Dir {
                    steps.push(Step::ScanDir(path));
                }
            }
            RawChange::Modified(_) if tracked => {
                if self.known.contains(&relative) {
                    self.record_change(relative, steps);
                } else if presence == Presence::File && self.known.insert(&relative) {
                    // Missed the create (e.g. during the priming window).
                    steps.push(Step::Emit(ChangeEvent::added(relative)));
                }
            }
            RawChange::Modified(_) => {}
            RawChange::Vanished(_) => {
                if tracked && self.known.remove(&relative) {
                    self.debouncer.remove(&relative);
                    steps.push(Step::Emit(ChangeEvent::removed(relative)));
                } else {
                    // Possibly a directory: everything known beneath it is gone.
                    for gone in self.known.remove_under(&relative) {
                        self.debouncer.remove(&gone);
                        steps.push(Step::Emit(ChangeEvent::removed(gone)));
                    }
                }
            }
            RawChange::Ambiguous(_) | RawChange::Rescan => {}
        }
    }

    fn record_change(&mut self, relative: String, steps: &mut Vec<Step>) {
        if self.debouncer.is_immediate() {
            steps.push(Step::Emit(ChangeEvent::changed(relative)));
        } else {
            self.debouncer.record(relative);
        }
    }

    /// Take debounced changes that have settled, as relative paths.
    ///
    /// Capture a [`DiskSnapshot`] of [`absolute`](Self::absolute) paths for
    /// them and pass both to [`resolve_settled`](Self::resolve_settled).
    pub fn take_settled(&mut self) -> Vec<String> {
        self.debouncer
            .take_ready()
            .into_iter()
            .filter(|relative| self.known.contains(relative))
            .collect()
    }

    /// Turn settled paths into events.
    ///
    /// A file that disappeared while pending is reported as removed (some
    /// backends report a move-away as a modification).
    pub fn resolve_settled(&mut self, settled: Vec<String>, disk: &DiskSnapshot) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        for relative in settled {
            if !self.known.contains(&relative) {
                continue;
            }
            if disk.presence(&self.absolute(&relative)) == Presence::File {
                events.push(ChangeEvent::changed(relative));
            } else {
                self.known.remove(&relative);
                events.push(ChangeEvent::removed(relative));
            }
        }
        events
    }

    pub fn absolute(&self, relative: &str) -> PathBuf {
        from_slash_path(&self.root, relative)
    }

    /// Announce documents found in a newly appeared directory.
    pub fn discovered(&mut self, files: impl IntoIterator<Item = String>) -> Vec<ChangeEvent> {
        files
            .into_iter()
            .filter(|f| self.known.insert(f))
            .map(ChangeEvent::added)
            .collect()
    }

    /// Replace the known set with a full scan and report the differences.
    pub fn resync(&mut self, files: impl IntoIterator<Item = String>) -> Vec<ChangeEvent> {
        let (added, removed) = self.known.reconcile(files);
        for path in &removed {
            self.debouncer.remove(path);
        }
        removed
            .into_iter()
            .map(ChangeEvent::removed)
            .chain(added.into_iter().map(ChangeEvent::added))
            .collect()
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        to_slash_path(relative)
    }
}
