//! Document tree discovery.
//!
//! The tree is rebuilt from disk on every request. There is no cached tree
//! to go stale; the cost is a rescan per listing.

mod node;
mod walker;

pub use node::{FileNode, NodeKind};
pub use walker::{DocumentWalker, WalkOutcome, from_slash_path, to_slash_path};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::DocumentError;
use crate::filter::DocumentFilter;

/// Builds [`FileNode`] trees for a fixed root.
#[derive(Clone)]
pub struct TreeIndexer {
    root: PathBuf,
    walker: Arc<DocumentWalker>,
}

impl TreeIndexer {
    pub fn new(root: impl Into<PathBuf>, filter: DocumentFilter, respect_gitignore: bool) -> Self {
        Self {
            root: root.into(),
            walker: Arc::new(DocumentWalker::new(filter, respect_gitignore)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Match rule applied to discovered files.
    pub fn filter(&self) -> &DocumentFilter {
        self.walker.filter()
    }

    /// Enumerate every document under the root, in discovery order.
    pub fn list_files(&self) -> Result<Vec<String>, DocumentError> {
        self.check_root()?;
        let outcome = self.walker.walk(&self.root, &self.root);
        if outcome.skipped > 0 {
            crate::debug_event!("tree", "partial scan", "{} entries skipped", outcome.skipped);
        }
        Ok(outcome.files)
    }

    /// Enumerate documents below `dir` (which must be inside the root).
    ///
    /// Used for directories that appear after startup. Unreadable entries
    /// are skipped.
    pub fn list_files_in(&self, dir: &Path) -> Vec<String> {
        self.walker.walk(&self.root, dir).files
    }

    /// Scan the root and assemble the hierarchical tree.
    pub fn build_tree(&self) -> Result<FileNode, DocumentError> {
        let files = self.list_files()?;

        let mut root = FileNode::root(self.root_name());
        for file in &files {
            root.insert(file);
        }

        crate::debug_event!("tree", "built", "{} documents", files.len());
        Ok(root)
    }

    /// [`build_tree`](Self::build_tree) on the blocking pool.
    pub async fn build_tree_async(&self) -> Result<FileNode, DocumentError> {
        let indexer = self.clone();
        tokio::task::spawn_blocking(move || indexer.build_tree())
            .await
            .map_err(|e| DocumentError::Discovery {
                root: self.root.clone(),
                reason: e.to_string(),
            })?
    }

    /// [`list_files`](Self::list_files) on the blocking pool.
    pub async fn list_files_async(&self) -> Result<Vec<String>, DocumentError> {
        let indexer = self.clone();
        tokio::task::spawn_blocking(move || indexer.list_files())
            .await
            .map_err(|e| DocumentError::Discovery {
                root: self.root.clone(),
                reason: e.to_string(),
            })?
    }

    fn root_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    fn check_root(&self) -> Result<(), DocumentError> {
        let discovery = |reason: String| DocumentError::Discovery {
            root: self.root.clone(),
            reason,
        };

        let metadata = std::fs::metadata(&self.root).map_err(|e| discovery(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(discovery("not a directory".to_string()));
        }
        std::fs::read_dir(&self.root).map_err(|e| discovery(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn indexer(root: &Path) -> TreeIndexer {
        TreeIndexer::new(root, DocumentFilter::default(), false)
    }

    fn snapshot(tree: &FileNode) -> HashSet<(String, NodeKind)> {
        tree.iter().map(|n| (n.path.clone(), n.kind)).collect()
    }

    #[test]
    fn test_build_tree() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/c.md"), "c").unwrap();
        fs::write(root.join("a/b/d.md"), "d").unwrap();
        fs::write(root.join("a/skip.txt"), "skip").unwrap();
        fs::write(root.join("index.md"), "index").unwrap();

        let tree = indexer(root).build_tree().unwrap();

        assert_eq!(tree.path, "");
        assert_eq!(tree.kind, NodeKind::Directory);
        assert_eq!(tree.name, root.file_name().unwrap().to_string_lossy());
        assert_eq!(tree.file_count(), 3);
        assert_eq!(tree.find("a/b").map(|n| n.children().len()), Some(2));
        assert!(tree.find("a/skip.txt").is_none());
    }

    #[test]
    fn test_build_tree_twice_is_structurally_identical() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for dir in ["x", "y/z", "w"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        for file in ["x/1.md", "x/2.md", "y/z/3.md", "w/4.markdown", "5.md"] {
            fs::write(root.join(file), file).unwrap();
        }

        let indexer = indexer(root);
        let first = indexer.build_tree().unwrap();
        let second = indexer.build_tree().unwrap();

        assert_eq!(snapshot(&first), snapshot(&second));
    }

    #[test]
    fn test_empty_directories_not_listed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("empty/nested")).unwrap();

        let tree = indexer(root).build_tree().unwrap();
        assert!(tree.children().is_empty());
    }

    #[test]
    fn test_missing_root_is_discovery_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = indexer(&temp_dir.path().join("missing")).build_tree();
        assert!(matches!(result, Err(DocumentError::Discovery { .. })));
    }

    #[test]
    fn test_file_root_is_discovery_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.md");
        fs::write(&file, "not a dir").unwrap();

        let result = indexer(&file).build_tree();
        assert!(matches!(result, Err(DocumentError::Discovery { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("locked")).unwrap();
        fs::write(root.join("locked/secret.md"), "secret").unwrap();
        fs::write(root.join("open.md"), "open").unwrap();
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to root; nothing to skip then.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = DocumentWalker::new(DocumentFilter::default(), false).walk(root, root);
        let result = indexer(root).build_tree();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(outcome.skipped > 0);
        assert_eq!(outcome.files, vec!["open.md".to_string()]);

        let tree = result.unwrap();
        assert!(tree.find("open.md").is_some());
        assert!(tree.find("locked/secret.md").is_none());
    }

    #[tokio::test]
    async fn test_build_tree_async() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one.md"), "one").unwrap();

        let tree = indexer(temp_dir.path()).build_tree_async().await.unwrap();
        assert_eq!(tree.file_count(), 1);
    }
}
