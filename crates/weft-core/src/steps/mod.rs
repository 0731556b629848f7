//! The session-wide step log.
//!
//! Every parsed build action becomes a [`TrackedStep`] with a stable,
//! monotonically increasing id and a lifecycle status. The log is
//! append-only: steps from follow-up plan revisions extend it, nothing is
//! reordered, deduplicated, or deleted, so it doubles as an audit trail
//! for the steps view.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::BuildAction;

// ---------------------------------------------------------------------------
// StepStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a tracked step.
///
/// Transitions: `Pending -> Completed` or `Pending -> Failed`, each at
/// most once. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for StepStatus {
    type Err = StepStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(StepStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`StepStatus`] string.
#[derive(Debug, Clone)]
pub struct StepStatusParseError(pub String);

impl fmt::Display for StepStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step status: {:?}", self.0)
    }
}

impl std::error::Error for StepStatusParseError {}

// ---------------------------------------------------------------------------
// TrackedStep
// ---------------------------------------------------------------------------

/// A build action plus tracking metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedStep {
    /// Stable id, unique and increasing within a session.
    pub id: u64,
    pub status: StepStatus,
    pub created_at: DateTime<Utc>,
    /// Failure detail when `status == Failed` (structural conflicts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub action: BuildAction,
}

// ---------------------------------------------------------------------------
// StepLog
// ---------------------------------------------------------------------------

/// Ordered, append-only log of tracked steps for one session.
#[derive(Debug, Default)]
pub struct StepLog {
    steps: Vec<TrackedStep>,
    next_id: u64,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of actions as `Pending` steps, assigning ids in
    /// arrival order. Returns the newly appended slice.
    ///
    /// Duplicate paths across revisions are deliberately kept: both steps
    /// are tracked and applied in order, so the later write wins in the
    /// tree while the log still shows both.
    pub fn append(&mut self, actions: Vec<BuildAction>) -> &[TrackedStep] {
        let start = self.steps.len();
        let now = Utc::now();
        for action in actions {
            let id = self.next_id;
            self.next_id += 1;
            self.steps.push(TrackedStep {
                id,
                status: StepStatus::Pending,
                created_at: now,
                error: None,
                action,
            });
        }
        &self.steps[start..]
    }

    /// The full log, regardless of status.
    pub fn steps(&self) -> &[TrackedStep] {
        &self.steps
    }

    pub fn get(&self, id: u64) -> Option<&TrackedStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Ids of all steps still pending, in log order.
    pub fn pending_ids(&self) -> Vec<u64> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Pending)
            .map(|s| s.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Flip a pending step to `Completed`. Returns `false` when the step
    /// does not exist or is already terminal, so terminal states can
    /// never be overwritten.
    pub fn complete(&mut self, id: u64) -> bool {
        self.transition(id, StepStatus::Completed, None)
    }

    /// Flip a pending step to `Failed`, recording the failure detail.
    pub fn fail(&mut self, id: u64, error: impl Into<String>) -> bool {
        self.transition(id, StepStatus::Failed, Some(error.into()))
    }

    fn transition(&mut self, id: u64, to: StepStatus, error: Option<String>) -> bool {
        match self.steps.iter_mut().find(|s| s.id == id) {
            Some(step) if step.status == StepStatus::Pending => {
                step.status = to;
                step.error = error;
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ActionPath, BuildAction};

    fn file_action(path: &str) -> BuildAction {
        BuildAction::create_file(ActionPath::parse(path).unwrap(), "x")
    }

    #[test]
    fn append_assigns_increasing_ids_and_pending_status() {
        let mut log = StepLog::new();
        let appended = log.append(vec![file_action("a.txt"), file_action("b.txt")]);
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].id, 0);
        assert_eq!(appended[1].id, 1);
        assert!(appended.iter().all(|s| s.status == StepStatus::Pending));
    }

    #[test]
    fn ids_continue_across_revisions() {
        let mut log = StepLog::new();
        log.append(vec![file_action("a.txt")]);
        let second = log.append(vec![file_action("b.txt")]);
        assert_eq!(second[0].id, 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn duplicate_paths_are_both_tracked() {
        let mut log = StepLog::new();
        log.append(vec![file_action("same.txt")]);
        log.append(vec![file_action("same.txt")]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn complete_is_terminal() {
        let mut log = StepLog::new();
        log.append(vec![file_action("a.txt")]);
        assert!(log.complete(0));
        assert_eq!(log.get(0).unwrap().status, StepStatus::Completed);
        // No transition out of a terminal state.
        assert!(!log.complete(0));
        assert!(!log.fail(0, "late failure"));
        assert_eq!(log.get(0).unwrap().status, StepStatus::Completed);
    }

    #[test]
    fn fail_records_error_detail() {
        let mut log = StepLog::new();
        log.append(vec![file_action("a.txt")]);
        assert!(log.fail(0, "existing folder blocks file creation"));
        let step = log.get(0).unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(
            step.error.as_deref(),
            Some("existing folder blocks file creation")
        );
    }

    #[test]
    fn transition_on_unknown_id_is_rejected() {
        let mut log = StepLog::new();
        assert!(!log.complete(99));
    }

    #[test]
    fn pending_ids_filters_terminal_steps() {
        let mut log = StepLog::new();
        log.append(vec![file_action("a.txt"), file_action("b.txt"), file_action("c.txt")]);
        log.complete(0);
        log.fail(1, "conflict");
        assert_eq!(log.pending_ids(), vec![2]);
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [StepStatus::Pending, StepStatus::Completed, StepStatus::Failed] {
            let parsed: StepStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("running".parse::<StepStatus>().is_err());
    }
}
