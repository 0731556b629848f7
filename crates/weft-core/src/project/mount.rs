//! Mount projection: the nested directory/file record shape consumed by
//! the execution host's mount entry point.
//!
//! [`project`] is a pure, total, post-order recursion over the file
//! tree: every folder's contents are fully resolved before the folder is
//! attached to its parent, and projecting the same tree twice yields
//! structurally identical output. First-seen order is preserved via
//! insertion-ordered maps.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::tree::{FileNode, NodeKind};

/// The full mount structure: entry name to entry, insertion-ordered.
pub type MountStructure = IndexMap<String, MountEntry>;

/// One entry in the mount structure. Serializes to the host's wire
/// shape: `{"directory": {..}}` or `{"file": {"contents": ".."}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MountEntry {
    Directory { directory: MountStructure },
    File { file: FileContents },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContents {
    pub contents: String,
}

/// Project a sequence of sibling nodes into a mount structure.
pub fn project(nodes: &[FileNode]) -> MountStructure {
    let mut structure = MountStructure::new();
    for node in nodes {
        let entry = match node.kind {
            // Children first: the directory entry is only built once its
            // subtree is fully projected.
            NodeKind::Folder => MountEntry::Directory {
                directory: project(node.children()),
            },
            NodeKind::File => MountEntry::File {
                file: FileContents {
                    contents: node.content.clone().unwrap_or_default(),
                },
            },
        };
        structure.insert(node.name.clone(), entry);
    }
    structure
}

/// Total number of entries (directories and files) in a mount structure.
pub fn entry_count(structure: &MountStructure) -> usize {
    structure
        .values()
        .map(|entry| match entry {
            MountEntry::Directory { directory } => 1 + entry_count(directory),
            MountEntry::File { .. } => 1,
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ActionPath, BuildAction};
    use crate::project::materialize::materialize;
    use crate::project::tree::FileTree;
    use crate::steps::StepLog;

    fn tree_from(actions: Vec<BuildAction>) -> FileTree {
        let mut tree = FileTree::new();
        let mut log = StepLog::new();
        log.append(actions);
        materialize(&mut tree, &mut log);
        tree
    }

    fn file(path: &str, content: &str) -> BuildAction {
        BuildAction::create_file(ActionPath::parse(path).unwrap(), content)
    }

    #[test]
    fn file_entry_holds_contents() {
        let tree = tree_from(vec![file("index.js", "console.log('hi')")]);
        let mount = project(&tree.roots);
        assert_eq!(
            mount["index.js"],
            MountEntry::File {
                file: FileContents {
                    contents: "console.log('hi')".into()
                }
            }
        );
    }

    #[test]
    fn nested_folders_project_recursively() {
        let tree = tree_from(vec![file("src/components/App.tsx", "export {}")]);
        let mount = project(&tree.roots);
        let MountEntry::Directory { directory: src } = &mount["src"] else {
            panic!("src should be a directory entry");
        };
        let MountEntry::Directory { directory: components } = &src["components"] else {
            panic!("components should be a directory entry");
        };
        assert!(matches!(components["App.tsx"], MountEntry::File { .. }));
    }

    #[test]
    fn empty_folder_projects_to_empty_directory() {
        let tree = tree_from(vec![BuildAction::create_folder(
            ActionPath::parse("assets").unwrap(),
        )]);
        let mount = project(&tree.roots);
        assert_eq!(
            mount["assets"],
            MountEntry::Directory {
                directory: MountStructure::new()
            }
        );
    }

    #[test]
    fn absent_content_projects_to_empty_string() {
        let tree = FileTree {
            roots: vec![crate::project::tree::FileNode::file("todo.txt", "todo.txt", None)],
        };
        let mount = project(&tree.roots);
        assert_eq!(
            mount["todo.txt"],
            MountEntry::File {
                file: FileContents {
                    contents: String::new()
                }
            }
        );
    }

    #[test]
    fn projection_is_total_over_all_nodes() {
        let tree = tree_from(vec![
            file("src/main.rs", "fn main() {}"),
            file("src/lib.rs", "pub fn f() {}"),
            file("tests/basic.rs", "#[test] fn t() {}"),
            file("Cargo.toml", "[package]"),
        ]);
        let mount = project(&tree.roots);
        assert_eq!(entry_count(&mount), tree.node_count());
    }

    #[test]
    fn projection_is_deterministic() {
        let tree = tree_from(vec![
            file("b.txt", "b"),
            file("a/nested.txt", "n"),
            file("a/other.txt", "o"),
        ]);
        assert_eq!(project(&tree.roots), project(&tree.roots));
    }

    #[test]
    fn projection_preserves_first_seen_order() {
        let tree = tree_from(vec![file("z.txt", "z"), file("a.txt", "a")]);
        let mount = project(&tree.roots);
        let names: Vec<&String> = mount.keys().collect();
        assert_eq!(names, vec!["z.txt", "a.txt"]);
    }

    #[test]
    fn serializes_to_host_wire_shape() {
        let tree = tree_from(vec![file("src/index.js", "x")]);
        let mount = project(&tree.roots);
        let json = serde_json::to_value(&mount).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "src": {
                    "directory": {
                        "index.js": { "file": { "contents": "x" } }
                    }
                }
            })
        );
    }
}
