//! File system walker for discovering documents under the root
//!
//! This module provides directory traversal with support for:
//! - Extension filtering through [`DocumentFilter`]
//! - Hidden file and directory exclusion
//! - Optional .gitignore rules
//! - Skipping unreadable entries without aborting the walk

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::filter::DocumentFilter;

/// Walks a directory tree and yields root-relative document paths
pub struct DocumentWalker {
    filter: DocumentFilter,
    respect_gitignore: bool,
}

/// Outcome of a single walk
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Slash-separated relative paths in discovery order
    pub files: Vec<String>,
    /// Entries that could not be read and were skipped
    pub skipped: usize,
}

impl DocumentWalker {
    pub fn new(filter: DocumentFilter, respect_gitignore: bool) -> Self {
        Self {
            filter,
            respect_gitignore,
        }
    }

    pub fn filter(&self) -> &DocumentFilter {
        &self.filter
    }

    /// Walk `dir` and return documents relative to `root`.
    ///
    /// `dir` must be `root` or a directory below it. Unreadable entries are
    /// logged and skipped.
    pub fn walk(&self, root: &Path, dir: &Path) -> WalkOutcome {
        let mut builder = WalkBuilder::new(dir);

        builder
            .hidden(true) // Skip dotfiles and dot-directories
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(false) // .ignore files are not part of the match rule
            .parents(self.respect_gitignore)
            .follow_links(false) // Symlinks could point outside the root
            .max_depth(None)
            .require_git(false);

        let mut outcome = WalkOutcome::default();

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("[tree] skipping unreadable entry: {e}");
                    outcome.skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            if !self.filter.matches(relative) {
                continue;
            }

            if let Some(relative) = to_slash_path(relative) {
                outcome.files.push(relative);
            }
        }

        outcome
    }
}

/// Convert a relative path into the slash-separated form used on the wire.
///
/// Returns `None` for non-UTF-8 paths, which cannot be addressed by clients.
pub fn to_slash_path(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        parts.push(component.as_os_str().to_str()?);
    }
    Some(parts.join("/"))
}

/// Convert a slash-separated relative path back into a native path under `root`.
pub fn from_slash_path(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(relative.split('/').filter(|s| !s.is_empty()));
    path
}
