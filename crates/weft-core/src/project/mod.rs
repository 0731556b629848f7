//! The virtual project: file tree, step materialization, and the mount
//! projection handed to the execution host.

pub mod materialize;
pub mod mount;
pub mod tree;

pub use materialize::{ApplyReport, ConflictError, StepConflict, materialize};
pub use mount::{MountEntry, MountStructure, project};
pub use tree::{FileNode, FileTree, NodeKind, find_child, find_child_idx};
