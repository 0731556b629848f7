//! Configuration file management for weft.
//!
//! Provides a TOML-based config file at `~/.config/weft/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use weft_core::planner::CommandPlanner;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub planner: PlannerSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlannerSection {
    /// Model CLI invoked for classification and planning turns.
    pub command: String,
    /// Extra arguments passed on every invocation.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            command: "llm".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3100,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the weft config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/weft` or `~/.config/weft`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("weft");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("weft")
}

/// Return the path to the weft config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct WeftConfig {
    pub planner_command: String,
    pub planner_args: Vec<String>,
    pub bind: String,
    pub port: u16,
}

impl WeftConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Planner command: `cli_planner_cmd` > `WEFT_PLANNER_CMD` env > `config_file.planner.command` > `"llm"`
    /// - Planner args: `config_file.planner.args` > empty
    /// - Bind address: `WEFT_BIND` env > `config_file.server.bind` > `127.0.0.1`
    /// - Port: `WEFT_PORT` env > `config_file.server.port` > `3100`
    pub fn resolve(cli_planner_cmd: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let planner_command = if let Some(cmd) = cli_planner_cmd {
            cmd.to_string()
        } else if let Ok(cmd) = std::env::var("WEFT_PLANNER_CMD") {
            cmd
        } else if let Some(ref cfg) = file_config {
            cfg.planner.command.clone()
        } else {
            PlannerSection::default().command
        };

        let planner_args = file_config
            .as_ref()
            .map(|cfg| cfg.planner.args.clone())
            .unwrap_or_default();

        let bind = if let Ok(bind) = std::env::var("WEFT_BIND") {
            bind
        } else if let Some(ref cfg) = file_config {
            cfg.server.bind.clone()
        } else {
            ServerSection::default().bind
        };

        let port = if let Ok(port) = std::env::var("WEFT_PORT") {
            port.parse()
                .context("WEFT_PORT env var is not a valid port number")?
        } else if let Some(ref cfg) = file_config {
            cfg.server.port
        } else {
            ServerSection::default().port
        };

        Ok(Self {
            planner_command,
            planner_args,
            bind,
            port,
        })
    }

    /// Build the subprocess planner this config describes.
    pub fn planner(&self) -> CommandPlanner {
        CommandPlanner::with_command(self.planner_command.clone(), self.planner_args.clone())
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    #[test]
    fn config_file_roundtrip() {
        let original = ConfigFile {
            planner: PlannerSection {
                command: "/usr/local/bin/llm".to_string(),
                args: vec!["-m".to_string(), "fast".to_string()],
            },
            server: ServerSection {
                bind: "0.0.0.0".to_string(),
                port: 8080,
            },
        };

        let contents = toml::to_string_pretty(&original).unwrap();
        let loaded: ConfigFile = toml::from_str(&contents).unwrap();

        assert_eq!(loaded.planner.command, original.planner.command);
        assert_eq!(loaded.planner.args, original.planner.args);
        assert_eq!(loaded.server.bind, original.server.bind);
        assert_eq!(loaded.server.port, original.server.port);
    }

    #[test]
    fn empty_config_file_uses_section_defaults() {
        let loaded: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(loaded.planner.command, "llm");
        assert!(loaded.planner.args.is_empty());
        assert_eq!(loaded.server.port, 3100);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();

        unsafe { std::env::set_var("WEFT_PLANNER_CMD", "/env/llm") };

        let config = WeftConfig::resolve(Some("/cli/llm")).unwrap();
        assert_eq!(config.planner_command, "/cli/llm");

        unsafe { std::env::remove_var("WEFT_PLANNER_CMD") };
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();

        unsafe { std::env::set_var("WEFT_PLANNER_CMD", "/env/llm") };
        unsafe { std::env::set_var("WEFT_PORT", "9999") };

        let config = WeftConfig::resolve(None).unwrap();
        assert_eq!(config.planner_command, "/env/llm");
        assert_eq!(config.port, 9999);

        unsafe { std::env::remove_var("WEFT_PLANNER_CMD") };
        unsafe { std::env::remove_var("WEFT_PORT") };
    }

    #[test]
    fn resolve_rejects_bad_port_env() {
        let _lock = lock_env();

        unsafe { std::env::set_var("WEFT_PORT", "not-a-port") };
        let result = WeftConfig::resolve(None);
        unsafe { std::env::remove_var("WEFT_PORT") };

        assert!(result.is_err());
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();

        unsafe { std::env::remove_var("WEFT_PLANNER_CMD") };
        unsafe { std::env::remove_var("WEFT_BIND") };
        unsafe { std::env::remove_var("WEFT_PORT") };
        // Point HOME and XDG_CONFIG_HOME to a temp dir so load_config()
        // cannot find a real config file.
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_home = std::env::var("HOME").ok();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("HOME", tmp.path()) };
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };

        let result = WeftConfig::resolve(None);

        // Restore env before asserting, to avoid poisoning the mutex on failure.
        match orig_home {
            Some(h) => unsafe { std::env::set_var("HOME", h) },
            None => unsafe { std::env::remove_var("HOME") },
        }
        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        let config = result.unwrap();
        assert_eq!(config.planner_command, "llm");
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.port, 3100);
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("weft/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
