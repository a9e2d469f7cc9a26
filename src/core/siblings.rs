#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;

use crate::core::git;
use crate::error::VibeError;

/// A task worktree in some repository's workspace, matched by branch name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SiblingWorktree {
    pub repository: String,
    pub path: String,
    pub branch: String,
}

/// Every worktree across all workspaces currently checked out to `branch`
/// (exact match). Multi-repo tasks carry no persisted link; their members
/// are discovered by scanning for branch-name equality, so the result is
/// derived fresh on every call. Branch resolution runs concurrently and a
/// failure for one entry never aborts the scan of the others.
pub async fn find_siblings(
    workspaces_root: &Path,
    branch: &str,
    concurrency: usize,
) -> Result<Vec<SiblingWorktree>, VibeError> {
    let candidates = enumerate_worktrees(workspaces_root);

    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(candidates.len());

    for (repository, path) in candidates {
        let permit = sem
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| VibeError::Other("failed to acquire branch scan semaphore".to_owned()))?;
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let branch = git::branch_in_dir(&path);
            SiblingWorktree {
                repository,
                path: path.to_string_lossy().into_owned(),
                branch,
            }
        }));
    }

    let mut matches = Vec::new();
    for h in handles {
        let entry = h
            .await
            .map_err(|e| VibeError::Other(format!("branch scan join error: {e}")))?;
        if entry.branch == branch {
            matches.push(entry);
        }
    }
    Ok(matches)
}

/// All `(repository, task path)` pairs under the global workspaces root.
/// A missing root yields nothing; stray files are skipped.
fn enumerate_worktrees(workspaces_root: &Path) -> Vec<(String, PathBuf)> {
    let Ok(repos) = std::fs::read_dir(workspaces_root) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for repo in repos.flatten() {
        let repo_dir = repo.path();
        if !repo_dir.is_dir() {
            continue;
        }
        let Some(repo_name) = repo.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Ok(tasks) = std::fs::read_dir(&repo_dir) else {
            continue;
        };
        for task in tasks.flatten() {
            let task_dir = task.path();
            if task_dir.is_dir() {
                out.push((repo_name.clone(), task_dir));
            }
        }
    }
    out
}
