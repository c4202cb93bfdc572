//! Reconstruct a nested file tree from the flat recursive tree listing.

use serde::Serialize;

use crate::client::{EntryKind, TreeEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Dir,
}

/// One node of the reconstructed tree. Request-scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    fn dir(name: &str, path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
            kind: NodeKind::Dir,
            size: None,
            children: Vec::new(),
        }
    }

    fn file(name: &str, path: String, size: Option<u64>) -> Self {
        Self {
            name: name.to_string(),
            path,
            kind: NodeKind::File,
            size,
            children: Vec::new(),
        }
    }
}

/// Build the tree scoped to `prefix` (empty prefix means the whole repo).
///
/// Entries may arrive in any order; intermediate directories are created on
/// demand, so directories with only nested children still materialize. Every
/// directory's children end up sorted directories-first, then by name
/// (case-sensitive), recursively. The root has no children when nothing
/// matches the prefix.
pub fn build_file_tree(entries: &[TreeEntry], prefix: &str) -> FileNode {
    let normalized = prefix.trim_matches('/');
    let root_name = normalized.rsplit('/').next().unwrap_or(normalized);
    let mut root = FileNode::dir(root_name, normalized.to_string());
    let prefix_slash = if normalized.is_empty() {
        String::new()
    } else {
        format!("{normalized}/")
    };

    for entry in entries {
        let Some(relative) = entry.path.strip_prefix(&prefix_slash) else {
            continue;
        };
        if relative.is_empty() {
            continue;
        }
        insert_entry(&mut root, relative, entry);
    }

    sort_tree(&mut root);
    root
}

fn insert_entry(root: &mut FileNode, relative: &str, entry: &TreeEntry) {
    let parts: Vec<&str> = relative.split('/').collect();
    let mut current = root;

    for (index, part) in parts.iter().enumerate() {
        let is_last = index == parts.len() - 1;
        let next_path = if current.path.is_empty() {
            (*part).to_string()
        } else {
            format!("{}/{part}", current.path)
        };

        if is_last {
            // First entry for a path wins; the recursive listing never
            // legitimately repeats a path.
            if current.children.iter().any(|n| n.path == next_path) {
                return;
            }
            let node = match entry.kind {
                EntryKind::Blob => FileNode::file(part, next_path, entry.size),
                _ => FileNode::dir(part, next_path),
            };
            current.children.push(node);
            return;
        }

        let position = match current.children.iter().position(|n| n.path == next_path) {
            Some(position) => position,
            None => {
                current.children.push(FileNode::dir(part, next_path));
                current.children.len() - 1
            },
        };
        current = &mut current.children[position];
    }
}

fn sort_tree(node: &mut FileNode) {
    node.children.sort_by(|a, b| {
        if a.kind != b.kind {
            return if a.kind == NodeKind::Dir {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Greater
            };
        }
        a.name.cmp(&b.name)
    });
    for child in &mut node.children {
        sort_tree(child);
    }
}
