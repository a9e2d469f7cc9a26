#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::VibeError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Prepended to the task name to form the branch name.
    pub branch_prefix: String,
    /// Auxiliary files replicated from the source root into each new
    /// workspace; missing sources are skipped.
    pub files_to_copy: Vec<String>,
    /// Parallelism of the read-only branch scans.
    pub scan_concurrency: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            branch_prefix: "feature/".to_owned(),
            files_to_copy: vec![".envrc".to_owned(), ".claude/settings.local.json".to_owned()],
            scan_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub executable: String,
    pub direnv_executable: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            executable: "claude".to_owned(),
            direnv_executable: "direnv".to_owned(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), VibeError> {
        if self.workspace.scan_concurrency == 0 {
            return Err(VibeError::Config(
                "workspace.scan_concurrency must be >= 1".to_owned(),
            ));
        }
        if self
            .workspace
            .files_to_copy
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(VibeError::Config(
                "workspace.files_to_copy must not contain empty entries".to_owned(),
            ));
        }
        if self.agent.executable.trim().is_empty() {
            return Err(VibeError::Config(
                "agent.executable must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
}

pub fn default_paths() -> anyhow::Result<ConfigPaths> {
    let unix = home_config_path_unix();
    if !cfg!(windows) {
        return Ok(ConfigPaths { config_file: unix });
    }

    // Windows: prefer the Unix-style path if present for portability.
    if unix.exists() {
        return Ok(ConfigPaths { config_file: unix });
    }

    let proj = ProjectDirs::from("com", "vibe", "vibe")
        .context("failed to determine platform config directory")?;
    Ok(ConfigPaths {
        config_file: proj.config_dir().join("config.toml"),
    })
}

fn home_config_path_unix() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    home.join(".config").join("vibe").join("config.toml")
}

pub fn home_dir() -> Option<PathBuf> {
    if let Some(v) = std::env::var_os("HOME") {
        return Some(PathBuf::from(v));
    }
    if let Some(v) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(v));
    }
    let drive = std::env::var_os("HOMEDRIVE");
    let path = std::env::var_os("HOMEPATH");
    match (drive, path) {
        (Some(d), Some(p)) => Some(PathBuf::from(d).join(PathBuf::from(p))),
        _ => None,
    }
}

#[must_use]
pub fn tilde_path(input: &str) -> String {
    let Some(home) = home_dir() else {
        return input.to_owned();
    };
    tilde_path_with_home(input, &home.to_string_lossy())
}

#[must_use]
pub fn tilde_path_with_home(input: &str, home: &str) -> String {
    if home.is_empty() {
        return input.to_owned();
    }
    if let Some(rest) = input.strip_prefix(home) {
        if rest.is_empty() {
            return "~".to_owned();
        }
        if rest.starts_with(std::path::MAIN_SEPARATOR) {
            return format!("~{rest}");
        }
    }
    input.to_owned()
}

pub fn load() -> anyhow::Result<Config> {
    let paths = default_paths()?;
    let cfg = load_from_file(&paths.config_file)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn list_resolved_toml() -> anyhow::Result<String> {
    let cfg = load()?;
    Ok(toml::to_string_pretty(&cfg)?)
}

fn load_from_file(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let cfg: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse TOML in {}", path.display()))?;
    Ok(cfg)
}
