#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::VibeError;

/// Handle on one repository checkout, addressed by its top-level directory.
#[derive(Debug, Clone)]
pub struct Git {
    repo_root: PathBuf,
}

impl Git {
    pub fn from_cwd() -> Result<Self, VibeError> {
        let cwd = std::env::current_dir()
            .map_err(|e| VibeError::Other(format!("failed to get cwd: {e}")))?;
        let repo_root = find_repo_root(&cwd).ok_or(VibeError::NotInGitRepo)?;
        Ok(Self { repo_root })
    }

    pub fn from_dir(dir: &Path) -> Result<Self, VibeError> {
        let repo_root = find_repo_root(dir).ok_or(VibeError::NotInGitRepo)?;
        Ok(Self { repo_root })
    }

    #[must_use]
    pub fn new(repo_root: PathBuf) -> Self {
        Self { repo_root }
    }

    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Repository name stable across every worktree of the same repository:
    /// the parent segment of the shared `.git` directory. Falls back to the
    /// last segment of the root when the lookup fails.
    #[must_use]
    pub fn repo_name(&self) -> String {
        if let Ok(out) = self.run(&["rev-parse", "--git-common-dir"]) {
            let git_dir = out.trim();
            if !git_dir.is_empty() {
                let abs = if Path::new(git_dir).is_absolute() {
                    PathBuf::from(git_dir)
                } else {
                    self.repo_root.join(git_dir)
                };
                if let Some(name) = abs
                    .parent()
                    .and_then(Path::file_name)
                    .and_then(|s| s.to_str())
                {
                    return name.to_owned();
                }
            }
        }
        self.repo_root
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_owned()
    }

    /// Default branch from the remote's symbolic HEAD; `main` when the
    /// remote is absent or the ref is unset.
    #[must_use]
    pub fn default_branch(&self) -> String {
        let Ok(out) = self.run(&["symbolic-ref", "refs/remotes/origin/HEAD"]) else {
            return "main".to_owned();
        };
        let r#ref = out.trim();
        match r#ref.rsplit('/').next() {
            Some(branch) if !branch.is_empty() => branch.to_owned(),
            _ => "main".to_owned(),
        }
    }

    /// `git worktree add -b <branch> <path> [<base>]`. Fails when the path
    /// or branch already exists or the base does not resolve.
    pub fn add_worktree(
        &self,
        path: &Path,
        branch: &str,
        base: Option<&str>,
    ) -> Result<(), VibeError> {
        let path = path.to_string_lossy();
        if let Some(base) = base {
            let _ = self.run(&["worktree", "add", "-b", branch, &path, base])?;
        } else {
            let _ = self.run(&["worktree", "add", "-b", branch, &path])?;
        }
        Ok(())
    }

    pub fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), VibeError> {
        let path = path.to_string_lossy();
        if force {
            let _ = self.run(&["worktree", "remove", "--force", &path])?;
        } else {
            let _ = self.run(&["worktree", "remove", &path])?;
        }
        Ok(())
    }

    pub fn delete_branch(&self, branch: &str, force: bool) -> Result<(), VibeError> {
        if force {
            let _ = self.run(&["branch", "-D", branch])?;
        } else {
            let _ = self.run(&["branch", "-d", branch])?;
        }
        Ok(())
    }

    /// Streams `git diff <base>...HEAD` straight to the terminal. The
    /// viewer's exit status is not interpreted (pagers exit non-zero when
    /// quit early).
    pub fn show_range_diff(&self, base: &str) -> Result<(), VibeError> {
        let range = format!("{base}...HEAD");
        let _ = Command::new("git")
            .args(["diff", &range])
            .current_dir(&self.repo_root)
            .status()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => VibeError::GitNotFound,
                _ => VibeError::Other(format!("failed to run git: {e}")),
            })?;
        Ok(())
    }

    pub fn prune_worktrees(&self) -> Result<(), VibeError> {
        let _ = self.run(&["worktree", "prune"])?;
        Ok(())
    }

    /// Local and remote branch names, `HEAD` pointers filtered out.
    pub fn list_branch_names(&self) -> Result<Vec<String>, VibeError> {
        let out = self.run(&["branch", "-a", "--format=%(refname:short)"])?;
        let mut branches = Vec::new();
        for line in out.lines() {
            let name = line.trim();
            if name.is_empty() || name.contains("HEAD") {
                continue;
            }
            branches.push(name.to_owned());
        }
        Ok(branches)
    }

    pub fn run(&self, args: &[&str]) -> Result<String, VibeError> {
        let out = self.run_raw(args)?;
        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(VibeError::Other(format!(
                "git {}: {}",
                args.join(" "),
                stderr.trim()
            )))
        }
    }

    pub fn run_raw(&self, args: &[&str]) -> Result<Output, VibeError> {
        let out = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => VibeError::GitNotFound,
                _ => VibeError::Other(format!("failed to run git: {e}")),
            })?;
        Ok(out)
    }
}

/// Current branch of an arbitrary directory; empty string for a missing
/// directory, a detached HEAD, or anything that is not a checkout. Never an
/// error.
#[must_use]
pub fn branch_in_dir(dir: &Path) -> String {
    let Ok(out) = Command::new("git")
        .args(["branch", "--show-current"])
        .current_dir(dir)
        .output()
    else {
        return String::new();
    };
    if !out.status.success() {
        return String::new();
    }
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut cur = Some(start);
    while let Some(dir) = cur {
        let candidate = dir.join(".git");
        if candidate.is_dir() || candidate.is_file() {
            return Some(dir.to_path_buf());
        }
        cur = dir.parent();
    }
    None
}
