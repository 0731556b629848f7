//! Materialization: fold pending steps into the file tree.
//!
//! Steps apply in log order. `RunScript` steps complete immediately with
//! no tree effect (execution belongs to the host, out of band). File and
//! folder steps walk their path segments, creating intermediate folders
//! on demand; a repeated file path overwrites content in place, keeping
//! node identity and sibling order.
//!
//! A structural conflict (a file standing where a folder must go, or the
//! reverse) fails only the offending step; the rest of the batch still
//! applies. Batch atomicity toward readers is the session's job -- the
//! caller holds the session lock across the whole call.

use thiserror::Error;

use crate::plan::{ActionKind, ActionPath};
use crate::steps::StepLog;

use super::tree::{FileNode, FileTree, NodeKind, find_child_idx};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A structural conflict between a step and the existing tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("existing file at {path:?} blocks folder creation")]
    FileBlocksFolder { path: String },

    #[error("existing folder at {path:?} blocks file creation")]
    FolderBlocksFile { path: String },

    #[error("step carries no path")]
    MissingPath,
}

/// One failed step from a materialization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepConflict {
    pub step_id: u64,
    pub error: ConflictError,
}

/// Outcome of one materialization pass over the pending steps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyReport {
    /// Ids of steps applied (or logged, for scripts) and completed.
    pub applied: Vec<u64>,
    /// Steps excluded from the tree and marked failed.
    pub conflicts: Vec<StepConflict>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Materializer
// ---------------------------------------------------------------------------

/// Apply every pending step in the log to the tree, flipping each step's
/// status as its effect lands.
pub fn materialize(tree: &mut FileTree, log: &mut StepLog) -> ApplyReport {
    let mut report = ApplyReport::default();

    for id in log.pending_ids() {
        // The id came from the log a moment ago; a missing step would be
        // a bug in StepLog, so skip defensively rather than panic.
        let Some(step) = log.get(id) else { continue };

        let outcome = match step.action.kind {
            ActionKind::RunScript => Ok(()),
            ActionKind::CreateFile => match &step.action.path {
                Some(path) => {
                    let content = step.action.content.clone();
                    upsert_file(&mut tree.roots, path, content)
                }
                None => Err(ConflictError::MissingPath),
            },
            ActionKind::CreateFolder => match &step.action.path {
                Some(path) => ensure_folder(&mut tree.roots, path),
                None => Err(ConflictError::MissingPath),
            },
        };

        match outcome {
            Ok(()) => {
                log.complete(id);
                report.applied.push(id);
            }
            Err(error) => {
                tracing::warn!(step_id = id, error = %error, "step excluded by structural conflict");
                log.fail(id, error.to_string());
                report.conflicts.push(StepConflict { step_id: id, error });
            }
        }
    }

    report
}

/// Create or overwrite the file at `path`, auto-creating parent folders.
fn upsert_file(
    roots: &mut Vec<FileNode>,
    path: &ActionPath,
    content: Option<String>,
) -> Result<(), ConflictError> {
    let (siblings, name, full_path) = descend_to_parent(roots, path)?;
    match find_child_idx(siblings, name) {
        Some(idx) => {
            let existing = &mut siblings[idx];
            if existing.kind != NodeKind::File {
                return Err(ConflictError::FolderBlocksFile { path: full_path });
            }
            // Idempotent in-place update: identity and order preserved.
            existing.content = content;
        }
        None => siblings.push(FileNode::file(name, full_path, content)),
    }
    Ok(())
}

/// Ensure a folder exists at `path`, auto-creating parents. Re-creating
/// an existing folder is a no-op.
fn ensure_folder(roots: &mut Vec<FileNode>, path: &ActionPath) -> Result<(), ConflictError> {
    let (siblings, name, full_path) = descend_to_parent(roots, path)?;
    match find_child_idx(siblings, name) {
        Some(idx) => {
            if siblings[idx].kind != NodeKind::Folder {
                return Err(ConflictError::FileBlocksFolder { path: full_path });
            }
        }
        None => siblings.push(FileNode::folder(name, full_path)),
    }
    Ok(())
}

/// Walk the non-final segments of `path`, creating folders as needed, and
/// return the parent sibling sequence plus the final segment and its full
/// path. A file node sitting at a required folder prefix is a conflict;
/// it is never converted silently.
fn descend_to_parent<'t, 'p>(
    roots: &'t mut Vec<FileNode>,
    path: &'p ActionPath,
) -> Result<(&'t mut Vec<FileNode>, &'p str, String), ConflictError> {
    let segments: Vec<&str> = path.segments().collect();
    let (last, prefix_segments) = segments.split_last().expect("validated path is non-empty");

    let mut current = roots;
    let mut prefix = String::new();

    for segment in prefix_segments {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);

        let idx = match find_child_idx(current, segment) {
            Some(idx) => {
                if current[idx].kind != NodeKind::Folder {
                    return Err(ConflictError::FileBlocksFolder { path: prefix });
                }
                idx
            }
            None => {
                current.push(FileNode::folder(*segment, prefix.clone()));
                current.len() - 1
            }
        };
        current = current[idx].children.get_or_insert_with(Vec::new);
    }

    Ok((current, last, path.as_str().to_owned()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ActionPath, BuildAction};
    use crate::steps::StepStatus;

    fn path(p: &str) -> ActionPath {
        ActionPath::parse(p).unwrap()
    }

    fn apply(actions: Vec<BuildAction>) -> (FileTree, StepLog, ApplyReport) {
        let mut tree = FileTree::new();
        let mut log = StepLog::new();
        log.append(actions);
        let report = materialize(&mut tree, &mut log);
        (tree, log, report)
    }

    #[test]
    fn folders_auto_created_for_nested_file() {
        let (tree, log, report) = apply(vec![BuildAction::create_file(
            path("src/components/App.tsx"),
            "export {}",
        )]);
        assert!(report.is_clean());
        assert_eq!(log.steps()[0].status, StepStatus::Completed);

        let src = tree.node_at("src").unwrap();
        assert_eq!(src.kind, NodeKind::Folder);
        let components = tree.node_at("src/components").unwrap();
        assert_eq!(components.kind, NodeKind::Folder);
        let file = tree.node_at("src/components/App.tsx").unwrap();
        assert_eq!(file.kind, NodeKind::File);
        assert_eq!(file.content.as_deref(), Some("export {}"));
    }

    #[test]
    fn sibling_order_is_first_seen() {
        let (tree, _, _) = apply(vec![
            BuildAction::create_file(path("a/b.txt"), "X"),
            BuildAction::create_file(path("a/c.txt"), "Y"),
        ]);
        let a = tree.node_at("a").unwrap();
        let names: Vec<&str> = a.children().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "c.txt"]);
    }

    #[test]
    fn materializing_same_step_content_twice_is_idempotent() {
        let mut tree = FileTree::new();
        let mut log = StepLog::new();
        log.append(vec![BuildAction::create_file(path("a/b.txt"), "X")]);
        materialize(&mut tree, &mut log);
        let once = tree.clone();

        log.append(vec![BuildAction::create_file(path("a/b.txt"), "X")]);
        materialize(&mut tree, &mut log);
        assert_eq!(tree, once);
    }

    #[test]
    fn overwrite_keeps_single_node_with_latest_content() {
        let (tree, _, _) = apply(vec![
            BuildAction::create_file(path("a/b.txt"), "X"),
            BuildAction::create_file(path("a/b.txt"), "Z"),
        ]);
        let a = tree.node_at("a").unwrap();
        assert_eq!(a.children().len(), 1);
        assert_eq!(
            tree.node_at("a/b.txt").unwrap().content.as_deref(),
            Some("Z")
        );
    }

    #[test]
    fn run_script_completes_without_touching_tree() {
        let (tree, log, report) = apply(vec![BuildAction::run_script("npm install")]);
        assert_eq!(tree.node_count(), 0);
        assert_eq!(log.steps()[0].status, StepStatus::Completed);
        assert_eq!(report.applied, vec![0]);
    }

    #[test]
    fn explicit_folder_step_creates_folder() {
        let (tree, _, report) = apply(vec![BuildAction::create_folder(path("assets/images"))]);
        assert!(report.is_clean());
        assert_eq!(tree.node_at("assets/images").unwrap().kind, NodeKind::Folder);
    }

    #[test]
    fn recreating_existing_folder_is_noop() {
        let (tree, log, report) = apply(vec![
            BuildAction::create_folder(path("src")),
            BuildAction::create_folder(path("src")),
        ]);
        assert!(report.is_clean());
        assert_eq!(tree.roots.len(), 1);
        assert!(log.steps().iter().all(|s| s.status == StepStatus::Completed));
    }

    #[test]
    fn file_blocking_folder_prefix_is_a_conflict() {
        let (tree, log, report) = apply(vec![
            BuildAction::create_file(path("config"), "key=value"),
            BuildAction::create_file(path("config/settings.json"), "{}"),
        ]);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(
            report.conflicts[0].error,
            ConflictError::FileBlocksFolder {
                path: "config".into()
            }
        );
        // The file at `config` was not converted.
        assert_eq!(tree.node_at("config").unwrap().kind, NodeKind::File);
        assert_eq!(log.steps()[1].status, StepStatus::Failed);
    }

    #[test]
    fn folder_blocking_file_is_a_conflict() {
        let (_, log, report) = apply(vec![
            BuildAction::create_folder(path("src")),
            BuildAction::create_file(path("src"), "not a file"),
        ]);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(
            report.conflicts[0].error,
            ConflictError::FolderBlocksFile { path: "src".into() }
        );
        assert_eq!(log.steps()[1].status, StepStatus::Failed);
    }

    #[test]
    fn conflict_does_not_abort_the_batch() {
        let (tree, log, report) = apply(vec![
            BuildAction::create_file(path("blocker"), "file"),
            BuildAction::create_file(path("blocker/inner.txt"), "conflicting"),
            BuildAction::create_file(path("ok-before.txt"), "fine"),
            BuildAction::create_file(path("ok-after.txt"), "also fine"),
        ]);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.applied, vec![0, 2, 3]);
        assert!(tree.node_at("ok-before.txt").is_some());
        assert!(tree.node_at("ok-after.txt").is_some());
        assert_eq!(log.steps()[1].status, StepStatus::Failed);
        assert_eq!(log.steps()[2].status, StepStatus::Completed);
    }

    #[test]
    fn second_pass_with_no_pending_steps_changes_nothing() {
        let mut tree = FileTree::new();
        let mut log = StepLog::new();
        log.append(vec![BuildAction::create_file(path("a.txt"), "A")]);
        materialize(&mut tree, &mut log);
        let snapshot = tree.clone();

        let report = materialize(&mut tree, &mut log);
        assert!(report.applied.is_empty());
        assert_eq!(tree, snapshot);
    }
}
