//! The virtual file tree.
//!
//! A [`FileTree`] is the single mutable resource in the pipeline. It is
//! owned by the materializer; every other consumer gets a read-only
//! clone. Sibling order is first-seen order and is never sorted, so the
//! explorer view shows files in the order the plan created them.
//!
//! Child lookup goes through [`find_child`] / [`find_child_idx`] rather
//! than ad hoc scans, so the same sibling sequence is never aliased from
//! multiple recursion levels.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Folder,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Folder => "folder",
        })
    }
}

// ---------------------------------------------------------------------------
// FileNode
// ---------------------------------------------------------------------------

/// One node of the project tree.
///
/// Invariant: `path` is unique across the whole tree; `content` is
/// present only on files, `children` only on folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    /// Final path segment.
    pub name: String,
    /// Full path from the project root.
    pub path: String,
    pub kind: NodeKind,
    /// File payload; `None` means "not yet written".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Ordered children, first-seen order. Folders only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>, content: Option<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            content,
            children: None,
        }
    }

    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Folder,
            content: None,
            children: Some(Vec::new()),
        }
    }

    /// Children slice; empty for files.
    pub fn children(&self) -> &[FileNode] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Find a child by name within one sibling sequence.
pub fn find_child<'a>(siblings: &'a [FileNode], name: &str) -> Option<&'a FileNode> {
    siblings.iter().find(|n| n.name == name)
}

/// Index of a child by name, for mutation without aliasing the slice.
pub fn find_child_idx(siblings: &[FileNode], name: &str) -> Option<usize> {
    siblings.iter().position(|n| n.name == name)
}

// ---------------------------------------------------------------------------
// FileTree
// ---------------------------------------------------------------------------

/// The whole project tree: an ordered sequence of root nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileTree {
    pub roots: Vec<FileNode>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by its full path.
    pub fn node_at(&self, path: &str) -> Option<&FileNode> {
        let mut siblings = self.roots.as_slice();
        let mut found = None;
        for segment in path.split('/') {
            let node = find_child(siblings, segment)?;
            siblings = node.children();
            found = Some(node);
        }
        found
    }

    /// Total number of nodes (files and folders) in the tree.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[FileNode]) -> usize {
            nodes.iter().map(|n| 1 + count(n.children())).sum()
        }
        count(&self.roots)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
