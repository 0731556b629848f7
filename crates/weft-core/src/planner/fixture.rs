//! Canned planner for tests and offline demos.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ChatMessage, Planner, TemplateKind};

/// Planner that replays scripted replies instead of calling a model.
///
/// `classify` always returns the configured kind; each `complete` call
/// pops the next reply from the queue. An exhausted queue is an error so
/// tests notice unexpected extra turns.
#[derive(Clone)]
pub struct FixturePlanner {
    kind: TemplateKind,
    replies: Arc<Mutex<Vec<String>>>,
}

impl FixturePlanner {
    pub fn new(kind: TemplateKind, replies: Vec<String>) -> Self {
        // Stored reversed so pop() yields them in order.
        let mut replies = replies;
        replies.reverse();
        Self {
            kind,
            replies: Arc::new(Mutex::new(replies)),
        }
    }

    /// Convenience: a planner that answers every turn with the same text.
    pub fn single(kind: TemplateKind, reply: impl Into<String>) -> Self {
        Self::new(kind, vec![reply.into()])
    }
}

#[async_trait]
impl Planner for FixturePlanner {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn classify(&self, _prompt: &str) -> Result<TemplateKind> {
        Ok(self.kind)
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        let mut replies = self.replies.lock().await;
        match replies.pop() {
            Some(reply) => Ok(reply),
            None => bail!("fixture planner has no replies left"),
        }
    }
}
