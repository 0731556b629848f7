//! Subprocess planner adapter.
//!
//! Pipes the conversation transcript to an external model CLI on stdin
//! and treats everything the process prints on stdout as the model
//! reply. Any CLI that reads a prompt from stdin and writes text to
//! stdout works (e.g. `llm`, or a shell wrapper around a vendor API).

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::prompts::CLASSIFIER_PROMPT;
use super::{ChatMessage, Planner, TemplateKind};

/// Planner that shells out to a model CLI.
#[derive(Debug, Clone)]
pub struct CommandPlanner {
    /// Path to the model binary. Defaults to `"llm"` (found via `$PATH`).
    binary: String,
    /// Extra arguments passed on every invocation.
    args: Vec<String>,
}

impl CommandPlanner {
    /// Create a planner that will look for `llm` on `$PATH`.
    pub fn new() -> Self {
        Self {
            binary: "llm".to_string(),
            args: Vec::new(),
        }
    }

    /// Create a planner with a custom binary path and arguments.
    pub fn with_command(binary: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    /// Render a conversation into the flat transcript piped to stdin.
    ///
    /// Each turn is prefixed with a bracketed role tag on its own line so
    /// wrapper scripts can split the transcript back apart if they need
    /// per-role handling.
    fn render_transcript(messages: &[ChatMessage]) -> String {
        let mut out = String::new();
        for msg in messages {
            out.push_str(&format!("[{}]\n{}\n\n", msg.role, msg.content));
        }
        out
    }

    async fn run(&self, transcript: &str) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = cmd.spawn().with_context(|| {
            format!(
                "failed to spawn planner binary at '{}' -- is it installed and on PATH?",
                self.binary
            )
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(transcript.as_bytes())
                .await
                .context("failed to write transcript to planner stdin")?;
            // Dropping stdin closes the pipe so the child sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .context("failed to wait for planner process")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "planner exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8(output.stdout).context("planner output is not UTF-8")?;
        if stdout.trim().is_empty() {
            bail!("planner produced no output");
        }

        debug!(bytes = stdout.len(), "planner reply received");
        Ok(stdout)
    }
}

impl Default for CommandPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Planner for CommandPlanner {
    fn name(&self) -> &str {
        "command"
    }

    async fn classify(&self, prompt: &str) -> Result<TemplateKind> {
        let messages = [
            ChatMessage::system(CLASSIFIER_PROMPT),
            ChatMessage::user(prompt),
        ];
        let reply = self.run(&Self::render_transcript(&messages)).await?;
        let kind = reply.parse::<TemplateKind>()?;
        Ok(kind)
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.run(&Self::render_transcript(messages)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
