#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::Command;

use crate::error::VibeError;

/// Root directory ghq clones repositories under.
pub fn ghq_root() -> Result<PathBuf, VibeError> {
    let out = run(&["root"])?;
    let root = out.trim();
    if root.is_empty() {
        return Err(VibeError::Other("ghq root returned nothing".to_owned()));
    }
    Ok(PathBuf::from(root))
}

/// Relative repository identifiers known to ghq (`host/owner/repo`).
pub fn list_repos() -> Result<Vec<String>, VibeError> {
    let out = run(&["list"])?;
    Ok(collect_lines(&out))
}

/// Absolute checkout paths of every repository known to ghq.
pub fn list_repo_paths() -> Result<Vec<PathBuf>, VibeError> {
    let out = run(&["list", "--full-path"])?;
    Ok(collect_lines(&out).into_iter().map(PathBuf::from).collect())
}

fn collect_lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

fn run(args: &[&str]) -> Result<String, VibeError> {
    let out = Command::new("ghq")
        .args(args)
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VibeError::GhqNotFound,
            _ => VibeError::Other(format!("failed to run ghq: {e}")),
        })?;
    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&out.stderr);
        Err(VibeError::Other(format!(
            "ghq {}: {}",
            args.join(" "),
            stderr.trim()
        )))
    }
}
