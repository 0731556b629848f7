//! Typed build actions extracted from a plan.
//!
//! A [`BuildAction`] is one instruction from the model's plan: create a
//! file with content, create a folder, or run a shell command. File and
//! folder actions carry a validated [`ActionPath`]; script actions carry
//! the command line instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// The kind of a build action. Closed set; new kinds require materializer
/// support before the parser may emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateFile,
    CreateFolder,
    RunScript,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreateFile => "create_file",
            Self::CreateFolder => "create_folder",
            Self::RunScript => "run_script",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ActionPath
// ---------------------------------------------------------------------------

/// Errors produced when validating an action path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path {0:?} has a trailing slash")]
    TrailingSlash(String),

    #[error("path {0:?} contains an empty segment")]
    EmptySegment(String),

    #[error("path {0:?} escapes the project root")]
    Traversal(String),
}

/// A validated slash-separated path relative to the project root.
///
/// Invariants, enforced at construction:
/// - non-empty, no trailing slash
/// - no empty segments (which also rules out absolute paths and `//`)
/// - no `.` or `..` segments, so the path cannot escape the root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionPath(String);

impl ActionPath {
    /// Validate and wrap a raw path. A single leading `/` is tolerated
    /// and stripped, since models frequently emit root-anchored paths.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let s = raw.strip_prefix('/').unwrap_or(raw);
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        if s.ends_with('/') {
            return Err(PathError::TrailingSlash(raw.to_owned()));
        }
        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(raw.to_owned()));
            }
            if segment == "." || segment == ".." {
                return Err(PathError::Traversal(raw.to_owned()));
            }
        }
        Ok(Self(s.to_owned()))
    }

    /// The path as a string slice, without a leading slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ordered path segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The final segment (file or folder name).
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ActionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ActionPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ActionPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ActionPath> for String {
    fn from(p: ActionPath) -> Self {
        p.0
    }
}

// ---------------------------------------------------------------------------
// BuildAction
// ---------------------------------------------------------------------------

/// One instruction extracted from the plan text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildAction {
    pub kind: ActionKind,
    /// Target path; present for `CreateFile` / `CreateFolder`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<ActionPath>,
    /// Full file content; present only for `CreateFile`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Shell command line; present only for `RunScript`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Human-readable summary for the steps view; not structural.
    pub title: String,
}

impl BuildAction {
    /// A file-creation action with full content.
    pub fn create_file(path: ActionPath, content: impl Into<String>) -> Self {
        let title = format!("Create {path}");
        Self {
            kind: ActionKind::CreateFile,
            path: Some(path),
            content: Some(content.into()),
            command: None,
            title,
        }
    }

    /// A folder-creation action.
    pub fn create_folder(path: ActionPath) -> Self {
        let title = format!("Create folder {path}");
        Self {
            kind: ActionKind::CreateFolder,
            path: Some(path),
            content: None,
            command: None,
            title,
        }
    }

    /// A script action. Recorded for display only; this core never runs
    /// commands.
    pub fn run_script(command: impl Into<String>) -> Self {
        let command = command.into();
        let title = match command.lines().next() {
            Some(first) if !first.trim().is_empty() => format!("Run `{}`", first.trim()),
            _ => "Run command".to_owned(),
        };
        Self {
            kind: ActionKind::RunScript,
            path: None,
            content: None,
            command: Some(command),
            title,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
