#![forbid(unsafe_code)]

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::VibeError;

/// Base branch of the task, exported for diff tooling inside the session.
pub const ENV_BASE_BRANCH: &str = "VIBE_BASE_BRANCH";
/// `:`-joined sibling workspace paths of a multi-repository task.
pub const ENV_REPOS: &str = "VIBE_REPOS";

#[must_use]
pub fn command_exists(name: &str) -> bool {
    !matches!(
        Command::new(name)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound
    )
}

/// Runs the interactive agent in the workspace as a foreground process with
/// fully inherited I/O. Sibling workspaces are granted via `--add-dir` and
/// announced through the environment; the agent's exit status is not
/// interpreted.
pub fn launch_session(
    executable: &str,
    workspace: &Path,
    add_dirs: &[String],
    base_branch: &str,
) -> Result<(), VibeError> {
    let mut cmd = Command::new(executable);
    cmd.current_dir(workspace);
    cmd.env(ENV_BASE_BRANCH, base_branch);
    if !add_dirs.is_empty() {
        cmd.env(ENV_REPOS, add_dirs.join(":"));
        for dir in add_dirs {
            cmd.args(["--add-dir", dir]);
        }
    }
    cmd.stdin(Stdio::inherit());
    cmd.stdout(Stdio::inherit());
    cmd.stderr(Stdio::inherit());

    let _ = cmd
        .status()
        .map_err(|e| VibeError::Other(format!("failed to run {executable}: {e}")))?;
    Ok(())
}

/// `direnv allow` in the workspace. The workspace stays usable without an
/// authorized envrc, so the outcome is not reported.
pub fn allow_direnv(direnv: &str, workspace: &Path) {
    let _ = Command::new(direnv)
        .arg("allow")
        .current_dir(workspace)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

/// Runs a project-declared setup action through the shell inside the new
/// workspace. Returns whether the action exited zero; spawn failures count
/// as failure, never as an error.
#[must_use]
pub fn run_setup_command(command: &str, workspace: &Path) -> bool {
    Command::new("sh")
        .args(["-lc", command])
        .current_dir(workspace)
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
