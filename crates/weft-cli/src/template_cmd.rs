//! `weft template` command: classify a project prompt into a starter
//! template.

use anyhow::{Context, Result};

use weft_core::planner::{Planner, starter_plan};

/// Run the template command.
///
/// Prints the chosen template kind on the first line; with `print_plan`,
/// follows it with the starter plan markup so the output can be piped
/// straight into `weft build -`.
pub async fn run_template(planner: &dyn Planner, prompt: &str, print_plan: bool) -> Result<()> {
    let kind = planner
        .classify(prompt)
        .await
        .context("planner failed to classify the prompt")?;

    println!("{kind}");
    if print_plan {
        println!("{}", starter_plan(kind));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::planner::{FixturePlanner, TemplateKind};

    #[tokio::test]
    async fn run_template_succeeds_with_fixture() {
        let planner = FixturePlanner::new(TemplateKind::React, vec![]);
        run_template(&planner, "a landing page", true).await.unwrap();
    }
}
