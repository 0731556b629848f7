//! Core pipeline for weft: parse a model-produced build plan, track its
//! steps, fold them into a virtual file tree, and project that tree into
//! the mount structure consumed by the sandboxed execution host.
//!
//! The pipeline has four stages, connected by explicit function returns
//! rather than shared mutable state:
//!
//! ```text
//! plan text -> plan::parse_plan   (ordered build actions)
//!           -> steps::StepLog     (append-only tracked step log)
//!           -> project::materialize (file tree mutation)
//!           -> project::mount::project (host mount structure)
//! ```
//!
//! [`session::Workbench`] wires the stages together behind a single lock
//! so plan batches apply atomically. The [`planner`] module is the
//! boundary to the language model that produces plan text; everything it
//! returns re-enters the pipeline as ordinary text.

pub mod plan;
pub mod planner;
pub mod project;
pub mod session;
pub mod steps;

pub use plan::{ActionKind, ActionPath, BuildAction, ParsedPlan, parse_plan};
pub use planner::{ChatMessage, ChatRole, Planner, TemplateKind};
pub use project::mount::{MountEntry, MountStructure};
pub use project::tree::{FileNode, FileTree, NodeKind};
pub use session::{IngestReport, PlanError, SessionEvent, SessionSnapshot, Workbench};
pub use steps::{StepLog, StepStatus, TrackedStep};
