//! Match rule shared by tree discovery and the file watcher.
//!
//! Both sides must agree on which files are documents, otherwise a client
//! could be told about a file the listing never shows (or vice versa).

use std::path::{Component, Path};

/// Decides whether a path relative to the root is a tracked document.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    extensions: Vec<String>,
}

impl DocumentFilter {
    /// Create a filter for the given extensions (without leading dot).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Check a root-relative path against the rule.
    ///
    /// Any hidden component (file or directory starting with `.`) excludes
    /// the path.
    pub fn matches(&self, relative: &Path) -> bool {
        if Self::is_hidden(relative) {
            return false;
        }
        self.has_tracked_extension(relative)
    }

    /// True if the final component carries one of the tracked extensions.
    pub fn has_tracked_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|tracked| tracked.eq_ignore_ascii_case(ext))
            })
    }

    /// True if any normal component of the path starts with a dot.
    pub fn is_hidden(relative: &Path) -> bool {
        relative.components().any(|c| match c {
            Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
            _ => false,
        })
    }
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self::new(["md", "markdown"])
    }
}
