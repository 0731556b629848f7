mod build_cmd;
mod config;
mod serve_cmd;
mod template_cmd;

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use weft_core::planner::TemplateKind;

use config::WeftConfig;

#[derive(Parser)]
#[command(name = "weft", about = "Turn model-produced build plans into a browsable project tree")]
struct Cli {
    /// Planner command (overrides WEFT_PLANNER_CMD env var)
    #[arg(long, global = true)]
    planner_cmd: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a weft config file with default settings
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run plan markup through the pipeline and print the resulting tree
    Build {
        /// Path to a file with plan markup, or '-' for stdin
        file: String,
        /// Seed the session with a starter template first
        #[arg(long)]
        template: Option<TemplateKind>,
        /// Also print the mount structure as JSON
        #[arg(long)]
        mount: bool,
    },
    /// Classify a project prompt into a starter template
    Template {
        /// Project description to classify
        prompt: String,
        /// Also print the starter plan markup
        #[arg(long)]
        plan: bool,
    },
    /// Start the HTTP API server
    Serve {
        /// Bind address (overrides config file)
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Execute the `weft init` command: write config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile::default();
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  planner.command = {}", cfg.planner.command);
    println!("  server.bind = {}", cfg.server.bind);
    println!("  server.port = {}", cfg.server.port);
    println!();
    println!("Next: run `weft serve` to start the API, or `weft build <plan>` offline.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(force)?;
        }
        Commands::Build {
            file,
            template,
            mount,
        } => {
            build_cmd::run_build(&file, template, mount).await?;
        }
        Commands::Template { prompt, plan } => {
            let resolved = WeftConfig::resolve(cli.planner_cmd.as_deref())?;
            let planner = resolved.planner();
            template_cmd::run_template(&planner, &prompt, plan).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = WeftConfig::resolve(cli.planner_cmd.as_deref())?;
            let bind = bind.unwrap_or_else(|| resolved.bind.clone());
            let port = port.unwrap_or(resolved.port);
            let planner = Arc::new(resolved.planner());
            serve_cmd::run_serve(planner, &bind, port).await?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "weft", &mut std::io::stdout());
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_build_with_template() {
        let cli = Cli::parse_from(["weft", "build", "plan.xml", "--template", "react", "--mount"]);
        match cli.command {
            Commands::Build {
                file,
                template,
                mount,
            } => {
                assert_eq!(file, "plan.xml");
                assert_eq!(template, Some(TemplateKind::React));
                assert!(mount);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn cli_parses_serve_with_overrides() {
        let cli = Cli::parse_from(["weft", "serve", "--bind", "0.0.0.0", "--port", "8080"]);
        match cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
            }
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn cli_verifies() {
        Cli::command().debug_assert();
    }
}
