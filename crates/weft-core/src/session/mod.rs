//! Session orchestration: one [`Workbench`] per building session.
//!
//! The workbench owns the step log, the file tree, and the mount
//! structure behind a single async lock. [`Workbench::ingest_plan`] runs
//! parse -> append -> materialize -> project as one critical section, so
//! a new plan arrival can never fold into the tree while a previous
//! batch is in flight, and readers only ever observe pre- or post-batch
//! state.
//!
//! Consumers read via cloned [`SessionSnapshot`]s; live views can follow
//! step transitions on the broadcast channel returned by
//! [`Workbench::subscribe`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::plan::parse_plan;
use crate::project::materialize::materialize;
use crate::project::mount::{MountStructure, project};
use crate::project::tree::FileTree;
use crate::steps::{StepLog, StepStatus, TrackedStep};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced from plan ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The text produced no build actions. No steps were created; the
    /// caller may retry the whole exchange.
    #[error("plan text contains no recognizable build actions")]
    EmptyPlan,
}

// ---------------------------------------------------------------------------
// Reports, snapshots, events
// ---------------------------------------------------------------------------

/// A step excluded from the tree by a structural conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedStep {
    pub step_id: u64,
    pub error: String,
}

/// What one `ingest_plan` call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    /// Batch title from the artifact wrapper, if any.
    pub title: Option<String>,
    /// Ids of the steps appended by this batch, in order.
    pub appended: Vec<u64>,
    /// Ids applied to the tree (or logged, for scripts).
    pub applied: Vec<u64>,
    /// Steps excluded by structural conflicts.
    pub failed: Vec<FailedStep>,
}

/// A read-only copy of the session state, handed to the rendering layer
/// after each materialization pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub title: Option<String>,
    pub steps: Vec<TrackedStep>,
    pub tree: FileTree,
    pub mount: MountStructure,
}

/// Events published on the session broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A step reached a terminal status.
    StepUpdated { step_id: u64, status: StepStatus },
    /// A whole plan batch finished materializing.
    PlanApplied {
        title: Option<String>,
        applied: usize,
        failed: usize,
    },
}

// ---------------------------------------------------------------------------
// Workbench
// ---------------------------------------------------------------------------

struct State {
    log: StepLog,
    tree: FileTree,
    mount: MountStructure,
    title: Option<String>,
}

/// One building session: the exclusive owner of the file tree.
pub struct Workbench {
    id: Uuid,
    created_at: DateTime<Utc>,
    state: Mutex<State>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbench {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: Mutex::new(State {
                log: StepLog::new(),
                tree: FileTree::new(),
                mount: MountStructure::new(),
                title: None,
            }),
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Subscribe to step/batch events. Lagging receivers miss events
    /// rather than block the pipeline.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Fold one block of plan text into the session.
    ///
    /// Parsing happens outside the lock (it is pure); append,
    /// materialize, and mount projection run inside it, so the whole
    /// batch is atomic toward snapshot readers and later batches.
    pub async fn ingest_plan(&self, text: &str) -> Result<IngestReport, PlanError> {
        let parsed = parse_plan(text);
        if parsed.is_empty() {
            return Err(PlanError::EmptyPlan);
        }
        let batch_size = parsed.actions.len();

        let (report, events) = {
            let mut state = self.state.lock().await;
            if parsed.title.is_some() {
                state.title = parsed.title.clone();
            }

            let appended: Vec<u64> = state
                .log
                .append(parsed.actions)
                .iter()
                .map(|s| s.id)
                .collect();

            // Split borrow: the materializer needs the tree and the log
            // at once.
            let State { log, tree, .. } = &mut *state;
            let apply = materialize(tree, log);

            // Downstream consumers must never see a mount older than the
            // tree, so re-derive before the lock drops.
            state.mount = project(&state.tree.roots);

            let mut events: Vec<SessionEvent> = appended
                .iter()
                .filter_map(|id| {
                    state.log.get(*id).map(|s| SessionEvent::StepUpdated {
                        step_id: s.id,
                        status: s.status,
                    })
                })
                .collect();
            events.push(SessionEvent::PlanApplied {
                title: parsed.title.clone(),
                applied: apply.applied.len(),
                failed: apply.conflicts.len(),
            });

            let report = IngestReport {
                title: parsed.title,
                appended,
                applied: apply.applied,
                failed: apply
                    .conflicts
                    .into_iter()
                    .map(|c| FailedStep {
                        step_id: c.step_id,
                        error: c.error.to_string(),
                    })
                    .collect(),
            };
            (report, events)
        };

        tracing::info!(
            session_id = %self.id,
            steps = batch_size,
            applied = report.applied.len(),
            failed = report.failed.len(),
            "plan batch materialized"
        );

        // Publish after the lock drops; send errors just mean nobody is
        // listening.
        for event in events {
            let _ = self.events.send(event);
        }

        Ok(report)
    }

    /// Clone out the current state for read-only consumers.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            id: self.id,
            title: state.title.clone(),
            steps: state.log.steps().to_vec(),
            tree: state.tree.clone(),
            mount: state.mount.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
