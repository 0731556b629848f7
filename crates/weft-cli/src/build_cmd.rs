//! `weft build` command: run plan markup through the pipeline and print
//! the resulting step log and file tree.

use std::io::Read;

use anyhow::{Context, Result};

use weft_core::planner::{TemplateKind, starter_plan};
use weft_core::session::SessionSnapshot;
use weft_core::{FileNode, StepStatus, Workbench};

/// Run the build command.
///
/// Reads plan markup from `file` (or stdin when `file` is `-`), optionally
/// seeds the session with a starter template first, and prints the step
/// outcome plus the materialized tree. With `show_mount`, also prints the
/// mount structure as JSON on stdout.
pub async fn run_build(
    file: &str,
    template: Option<TemplateKind>,
    show_mount: bool,
) -> Result<()> {
    let text = read_plan_text(file)?;

    let bench = Workbench::new();
    if let Some(kind) = template {
        bench
            .ingest_plan(starter_plan(kind))
            .await
            .with_context(|| format!("failed to seed {kind} starter template"))?;
    }

    let report = bench
        .ingest_plan(&text)
        .await
        .context("input contains no build actions")?;

    let snapshot = bench.snapshot().await;
    print!("{}", render_report(&snapshot));

    if !report.failed.is_empty() {
        println!();
        println!("{} step(s) failed:", report.failed.len());
        for failed in &report.failed {
            println!("  step {}: {}", failed.step_id, failed.error);
        }
    }

    if show_mount {
        println!();
        println!("{}", serde_json::to_string_pretty(&snapshot.mount)?);
    }

    Ok(())
}

fn read_plan_text(file: &str) -> Result<String> {
    if file == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read plan markup from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("failed to read plan file {file}"))
    }
}

/// Render the step table and file tree for a snapshot.
fn render_report(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();

    if let Some(title) = &snapshot.title {
        out.push_str(&format!("Project: {title}\n\n"));
    }

    out.push_str("Steps:\n");
    for step in &snapshot.steps {
        let status_icon = match step.status {
            StepStatus::Pending => ".",
            StepStatus::Completed => "+",
            StepStatus::Failed => "!",
        };
        out.push_str(&format!(
            "  [{}] {:>3}  {}\n",
            status_icon, step.id, step.action.title
        ));
    }

    let completed = snapshot
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .count();
    out.push_str(&format!(
        "\n{completed}/{} steps completed\n",
        snapshot.steps.len()
    ));

    out.push_str("\nFiles:\n");
    render_tree(&snapshot.tree.roots, 1, &mut out);

    out
}

fn render_tree(nodes: &[FileNode], depth: usize, out: &mut String) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match &node.children {
            Some(children) => {
                out.push_str(&format!("{indent}{}/\n", node.name));
                render_tree(children, depth + 1, out);
            }
            None => {
                let size = node.content.as_ref().map(String::len).unwrap_or(0);
                out.push_str(&format!("{indent}{} ({size} bytes)\n", node.name));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
