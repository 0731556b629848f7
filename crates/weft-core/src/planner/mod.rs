//! The `Planner` trait -- the adapter interface for plan-producing models.
//!
//! Each concrete planner wraps a model backend and answers two questions:
//! which starter template fits a project prompt, and what plan text a
//! conversation should produce next. The trait is intentionally
//! object-safe so it can be stored as `Arc<dyn Planner>` behind the
//! server and CLI.

pub mod command;
pub mod fixture;
pub mod prompts;
pub mod templates;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use command::CommandPlanner;
pub use fixture::FixturePlanner;
pub use templates::starter_plan;

// ---------------------------------------------------------------------------
// Chat types
// ---------------------------------------------------------------------------

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn in a planning conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Template kinds
// ---------------------------------------------------------------------------

/// Error returned when parsing a [`TemplateKind`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown template kind: '{0}' (expected 'node' or 'react')")]
pub struct TemplateKindParseError(pub String);

/// The starter templates a project prompt can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Node,
    React,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Node => write!(f, "node"),
            TemplateKind::React => write!(f, "react"),
        }
    }
}

impl FromStr for TemplateKind {
    type Err = TemplateKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Models occasionally pad the answer with whitespace or casing.
        match s.trim().to_ascii_lowercase().as_str() {
            "node" => Ok(TemplateKind::Node),
            "react" => Ok(TemplateKind::React),
            other => Err(TemplateKindParseError(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Planner trait
// ---------------------------------------------------------------------------

/// Adapter interface for the model backend that produces plans.
///
/// # Object Safety
///
/// This trait is object-safe: every method returns a concrete type, so
/// implementors can be stored as `Arc<dyn Planner>` and shared between
/// the HTTP server and the CLI.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Human-readable name for this planner (e.g. "command").
    fn name(&self) -> &str;

    /// Decide which starter template fits a project prompt.
    async fn classify(&self, prompt: &str) -> Result<TemplateKind>;

    /// Run one planning turn and return the raw model text.
    ///
    /// The returned text is expected (but not guaranteed) to contain
    /// plan markup; callers feed it to the session unchanged.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

// Compile-time assertion: Planner must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Planner) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    /// A trivial planner, used only to prove the trait can be
    /// implemented and used as `dyn Planner`.
    struct NoopPlanner;

    #[async_trait]
    impl Planner for NoopPlanner {
        fn name(&self) -> &str {
            "noop"
        }

        async fn classify(&self, _prompt: &str) -> Result<TemplateKind> {
            Ok(TemplateKind::Node)
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn planner_is_object_safe() {
        let planner: Box<dyn Planner> = Box::new(NoopPlanner);
        assert_eq!(planner.name(), "noop");
    }

    #[tokio::test]
    async fn noop_planner_round_trip() {
        let planner: Box<dyn Planner> = Box::new(NoopPlanner);
        assert_eq!(planner.classify("a todo app").await.unwrap(), TemplateKind::Node);
        assert_eq!(
            planner.complete(&[ChatMessage::user("hi")]).await.unwrap(),
            ""
        );
    }

    #[test]
    fn template_kind_parses_loosely() {
        assert_eq!("node".parse::<TemplateKind>().unwrap(), TemplateKind::Node);
        assert_eq!(" React\n".parse::<TemplateKind>().unwrap(), TemplateKind::React);
        assert_eq!("NODE".parse::<TemplateKind>().unwrap(), TemplateKind::Node);
    }

    #[test]
    fn template_kind_rejects_unknown() {
        let err = "vue".parse::<TemplateKind>().unwrap_err();
        assert_eq!(err, TemplateKindParseError("vue".to_string()));
    }

    #[test]
    fn template_kind_display_round_trips() {
        for kind in [TemplateKind::Node, TemplateKind::React] {
            assert_eq!(kind.to_string().parse::<TemplateKind>().unwrap(), kind);
        }
    }

    #[test]
    fn chat_message_serializes_with_snake_case_role() {
        let msg = ChatMessage::assistant("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hello"}"#);
    }
}
