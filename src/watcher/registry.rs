//! Registry of documents the watcher has already announced.
//!
//! Seeded by the priming scan, then kept in step with every emitted event.
//! It turns raw notifications into the Added/Changed distinction and lets
//! a directory removal be expanded into per-file removals.

use std::collections::HashSet;

/// Set of known root-relative document paths.
#[derive(Debug, Default)]
pub struct KnownPaths {
    paths: HashSet<String>,
}

impl KnownPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path. Returns true if it was not known before.
    pub fn insert(&mut self, path: &str) -> bool {
        self.paths.insert(path.to_string())
    }

    /// Remove a path. Returns true if it was known.
    pub fn remove(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Remove and return every known path strictly below `dir`.
    pub fn remove_under(&mut self, dir: &str) -> Vec<String> {
        let prefix = format!("{dir}/");
        let mut removed: Vec<String> = self
            .paths
            .iter()
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect();
        for path in &removed {
            self.paths.remove(path);
        }
        removed.sort();
        removed
    }

    /// Replace the contents with `paths`, returning `(added, removed)`
    /// relative to the previous contents.
    pub fn reconcile(&mut self, paths: impl IntoIterator<Item = String>) -> (Vec<String>, Vec<String>) {
        let fresh: HashSet<String> = paths.into_iter().collect();

        let mut added: Vec<String> = fresh.difference(&self.paths).cloned().collect();
        let mut removed: Vec<String> = self.paths.difference(&fresh).cloned().collect();
        added.sort();
        removed.sort();

        self.paths = fresh;
        (added, removed)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut known = KnownPaths::new();
        assert!(known.insert("a.md"));
        assert!(!known.insert("a.md"));
        assert!(known.contains("a.md"));
        assert!(known.remove("a.md"));
        assert!(!known.remove("a.md"));
        assert!(known.is_empty());
    }

    #[test]
    fn test_remove_under_respects_segment_boundary() {
        let mut known = KnownPaths::new();
        for path in ["docs/a.md", "docs/sub/b.md", "docs2/c.md", "docs.md"] {
            known.insert(path);
        }

        let removed = known.remove_under("docs");
        assert_eq!(removed, vec!["docs/a.md", "docs/sub/b.md"]);
        assert_eq!(known.len(), 2);
        assert!(known.contains("docs2/c.md"));
        assert!(known.contains("docs.md"));
    }

    #[test]
    fn test_reconcile_reports_differences() {
        let mut known = KnownPaths::new();
        known.insert("keep.md");
        known.insert("gone.md");

        let (added, removed) = known.reconcile(vec!["keep.md".to_string(), "new.md".to_string()]);
        assert_eq!(added, vec!["new.md"]);
        assert_eq!(removed, vec!["gone.md"]);
        assert_eq!(known.len(), 2);
    }
}
