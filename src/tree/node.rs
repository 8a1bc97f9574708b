//! Document tree data model.

use serde::{Deserialize, Serialize};

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
}

/// One entry in the document tree.
///
/// Children are owned in discovery order. Files carry `None` so a file can
/// never gain children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    /// Create an empty directory node.
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: Some(Vec::new()),
        }
    }

    /// Create a file node.
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: None,
        }
    }

    /// Create the root node (`path` is empty).
    pub fn root(name: impl Into<String>) -> Self {
        Self::directory(name, "")
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn children(&self) -> &[FileNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Insert a slash-separated relative file path below this node.
    ///
    /// Walks one segment at a time, finding or creating the matching child.
    /// Intermediate segments become directories; only the last one is a
    /// file. Returns `false` if the path is empty or collides with an
    /// existing node of the other kind.
    pub fn insert(&mut self, relative: &str) -> bool {
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        let Some((file_name, dirs)) = segments.split_last() else {
            return false;
        };

        let mut current = self;
        for dir in dirs {
            let Some(children) = current.children.as_mut() else {
                return false;
            };
            let index = match children.iter().position(|c| c.name == *dir) {
                Some(index) => index,
                None => {
                    let path = join_path(&current.path, dir);
                    children.push(FileNode::directory(*dir, path));
                    children.len() - 1
                }
            };
            current = &mut children[index];
            if !current.is_dir() {
                return false;
            }
        }

        let Some(children) = current.children.as_mut() else {
            return false;
        };
        if let Some(existing) = children.iter().find(|c| c.name == *file_name) {
            return existing.kind == NodeKind::File;
        }
        let path = join_path(&current.path, file_name);
        children.push(FileNode::file(*file_name, path));
        true
    }

    /// Look up a node by its relative path.
    pub fn find(&self, relative: &str) -> Option<&FileNode> {
        let mut current = self;
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            current = current.children().iter().find(|c| c.name == segment)?;
        }
        Some(current)
    }

    /// Depth-first iterator over this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &FileNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }

    /// Number of file nodes in the subtree.
    pub fn file_count(&self) -> usize {
        self.iter().filter(|n| n.kind == NodeKind::File).count()
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_shares_intermediate_directories() {
        let mut root = FileNode::root("docs");
        assert!(root.insert("a/b/c.md"));
        assert!(root.insert("a/b/d.md"));

        assert_eq!(root.children().len(), 1);
        let a = &root.children()[0];
        assert_eq!((a.name.as_str(), a.path.as_str(), a.kind), ("a", "a", NodeKind::Directory));

        assert_eq!(a.children().len(), 1);
        let b = &a.children()[0];
        assert_eq!((b.name.as_str(), b.path.as_str(), b.kind), ("b", "a/b", NodeKind::Directory));

        let files: Vec<(&str, &str)> = b
            .children()
            .iter()
            .map(|f| (f.name.as_str(), f.path.as_str()))
            .collect();
        assert_eq!(files, vec![("c.md", "a/b/c.md"), ("d.md", "a/b/d.md")]);
        assert!(b.children().iter().all(|f| f.kind == NodeKind::File && f.children.is_none()));
    }

    #[test]
    fn test_insert_keeps_discovery_order() {
        let mut root = FileNode::root("docs");
        root.insert("zeta.md");
        root.insert("alpha.md");
        root.insert("mid/one.md");

        let names: Vec<&str> = root.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta.md", "alpha.md", "mid"]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut root = FileNode::root("docs");
        assert!(root.insert("a/x.md"));
        assert!(root.insert("a/x.md"));
        assert_eq!(root.file_count(), 1);
        assert_eq!(root.children()[0].children().len(), 1);
    }

    #[test]
    fn test_insert_rejects_kind_collisions() {
        let mut root = FileNode::root("docs");
        assert!(root.insert("a.md"));
        assert!(!root.insert("a.md/inner.md"));
        assert!(root.insert("dir/file.md"));
        assert!(!root.insert("dir"));
        assert!(!root.insert(""));
        assert_eq!(root.file_count(), 2);
    }

    #[test]
    fn test_path_invariant_holds_for_every_node() {
        let mut root = FileNode::root("docs");
        for path in ["a/b/c.md", "a/d.md", "e.md", "f/g/h/i.md"] {
            root.insert(path);
        }

        for node in root.iter() {
            for child in node.children() {
                assert_eq!(child.path, join_path(&node.path, &child.name));
            }
        }
        assert_eq!(root.find("f/g/h/i.md").map(|n| n.kind), Some(NodeKind::File));
        assert!(root.find("f/missing").is_none());
    }

    #[test]
    fn test_json_shape() {
        let mut root = FileNode::root("docs");
        root.insert("guide/intro.md");

        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "docs",
                "path": "",
                "type": "directory",
                "children": [{
                    "name": "guide",
                    "path": "guide",
                    "type": "directory",
                    "children": [{
                        "name": "intro.md",
                        "path": "guide/intro.md",
                        "type": "file"
                    }]
                }]
            })
        );
    }
}
