//! Tree command - print the documents discovered under a root.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::Settings;
use crate::sandbox::PathGuard;
use crate::tree::{FileNode, TreeIndexer};

/// Run the tree command.
pub fn run(root: Option<PathBuf>, json: bool, settings: &Settings) {
    let root = crate::cli::resolve_root(root, settings);

    let guard = match PathGuard::new(&root) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: cannot open {}: {e}", root.display());
            std::process::exit(1);
        }
    };

    let indexer = TreeIndexer::new(
        guard.root(),
        settings.documents.filter(),
        settings.documents.respect_gitignore,
    );

    let tree = match indexer.build_tree() {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&tree) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", render(&tree));
        println!("\n{} documents", tree.file_count());
    }
}

/// Indented text rendering in discovery order.
pub fn render(tree: &FileNode) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}/", tree.name);
    render_children(tree, 1, &mut out);
    out
}

fn render_children(node: &FileNode, depth: usize, out: &mut String) {
    for child in node.children() {
        let indent = "  ".repeat(depth);
        if child.is_dir() {
            let _ = writeln!(out, "{indent}{}/", child.name);
            render_children(child, depth + 1, out);
        } else {
            let _ = writeln!(out, "{indent}{}", child.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested() {
        let mut tree = FileNode::root("notes");
        tree.insert("guide/intro.md");
        tree.insert("index.md");

        assert_eq!(render(&tree), "notes/\n  guide/\n    intro.md\n  index.md\n");
    }
}
