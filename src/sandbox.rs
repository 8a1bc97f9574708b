//! Path guard confining client-supplied paths to the served root.
//!
//! Resolution is purely lexical and happens before any filesystem access,
//! so a rejected path never reaches `stat` or `read`. Out-of-sandbox paths
//! always come back as [`DocumentError::Forbidden`], whether or not the
//! target exists.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::DocumentError;

/// A client path that passed the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    absolute: PathBuf,
    relative: String,
}

impl ResolvedPath {
    /// Absolute location on disk, always under the guard's root.
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Normalized slash-separated path relative to the root ("" for the root).
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }
}

/// Resolves relative request paths against a canonical root.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for `root`, canonicalizing it once.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self { root })
    }

    /// The canonical root every resolved path lives under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `requested` against the root.
    ///
    /// `.` and empty segments are dropped, `..` pops a segment. Absolute
    /// inputs, NUL bytes and any `..` that would climb above the root are
    /// rejected.
    pub fn resolve(&self, requested: &str) -> Result<ResolvedPath, DocumentError> {
        if requested.contains('\0') {
            crate::debug_event!("sandbox", "rejected", "NUL byte in path");
            return Err(DocumentError::forbidden(requested));
        }

        let mut segments: Vec<&str> = Vec::new();
        for component in Path::new(requested).components() {
            match component {
                Component::Normal(name) => {
                    let Some(name) = name.to_str() else {
                        return Err(DocumentError::forbidden(requested));
                    };
                    segments.push(name);
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if segments.pop().is_none() {
                        crate::debug_event!("sandbox", "rejected", "{requested} escapes root");
                        return Err(DocumentError::forbidden(requested));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    crate::debug_event!("sandbox", "rejected", "{requested} is absolute");
                    return Err(DocumentError::forbidden(requested));
                }
            }
        }

        let mut absolute = self.root.clone();
        absolute.extend(&segments);

        // Final gate: component-wise prefix, so `/srv/docs2` never passes for `/srv/docs`.
        if !absolute.starts_with(&self.root) {
            return Err(DocumentError::forbidden(requested));
        }

        Ok(ResolvedPath {
            absolute,
            relative: segments.join("/"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guard() -> (TempDir, PathGuard) {
        let temp_dir = TempDir::new().unwrap();
        let guard = PathGuard::new(temp_dir.path()).unwrap();
        (temp_dir, guard)
    }

    fn assert_forbidden(guard: &PathGuard, path: &str) {
        match guard.resolve(path) {
            Err(DocumentError::Forbidden { .. }) => {}
            other => panic!("expected Forbidden for {path:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_resolves_inside_root() {
        let (_dir, guard) = guard();

        let resolved = guard.resolve("docs/guide.md").unwrap();
        assert_eq!(resolved.absolute(), guard.root().join("docs").join("guide.md"));
        assert_eq!(resolved.relative(), "docs/guide.md");
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, guard) = guard();

        assert_forbidden(&guard, "../../etc/passwd");
        assert_forbidden(&guard, "..");
        assert_forbidden(&guard, "docs/../../secret.md");
        assert_forbidden(&guard, "a/b/../../../c.md");
    }

    #[test]
    fn test_absolute_and_nul_rejected() {
        let (_dir, guard) = guard();

        assert_forbidden(&guard, "/etc/passwd");
        assert_forbidden(&guard, "notes\0.md");
    }

    #[test]
    fn test_inner_traversal_normalized() {
        let (_dir, guard) = guard();

        let resolved = guard.resolve("docs/../notes/./today.md").unwrap();
        assert_eq!(resolved.relative(), "notes/today.md");
        assert_eq!(resolved.absolute(), guard.root().join("notes").join("today.md"));
    }

    #[test]
    fn test_root_itself_allowed() {
        let (_dir, guard) = guard();

        for path in ["", ".", "docs/.."] {
            let resolved = guard.resolve(path).unwrap();
            assert!(resolved.is_root(), "{path:?} should resolve to root");
            assert_eq!(resolved.absolute(), guard.root());
        }
    }

    #[test]
    fn test_sibling_with_shared_prefix_rejected() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("docs");
        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(parent.path().join("docs2")).unwrap();
        std::fs::write(parent.path().join("docs2/leak.md"), "secret").unwrap();

        let guard = PathGuard::new(&root).unwrap();
        assert_forbidden(&guard, "../docs2/leak.md");
    }

    #[test]
    fn test_missing_and_existing_outside_paths_both_forbidden() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(parent.path().join("exists.md"), "outside").unwrap();

        let guard = PathGuard::new(&root).unwrap();
        assert_forbidden(&guard, "../exists.md");
        assert_forbidden(&guard, "../does-not-exist.md");
    }

    #[test]
    fn test_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(PathGuard::new(temp_dir.path().join("missing")).is_err());
    }
}
