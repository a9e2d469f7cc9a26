#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::core::git::{self, Git};
use crate::core::workspace;
use crate::error::VibeError;

/// One task selected for deletion, with its branch resolved best-effort
/// (empty when the worktree has no resolvable branch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: String,
    pub path: PathBuf,
    pub branch: String,
}

/// Tasks eligible for cleanup: everything under the workspace root except
/// the task the caller is currently standing inside. A task must never be
/// able to delete itself out from under the running process.
#[must_use]
pub fn candidate_tasks(workspace_root: &Path, cwd: &Path) -> Vec<String> {
    let current = workspace::current_task(cwd, workspace_root);
    workspace::list_tasks(workspace_root)
        .into_iter()
        .filter(|task| current.as_deref() != Some(task.as_str()))
        .collect()
}

/// Resolves the branch of each selected task concurrently. These are
/// independent read-only lookups; a failure for one entry just leaves its
/// branch empty.
pub async fn resolve_tasks(
    workspace_root: &Path,
    names: &[String],
    concurrency: usize,
) -> Result<Vec<TaskInfo>, VibeError> {
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(names.len());

    for name in names {
        let name = name.clone();
        let path = workspace_root.join(&name);
        let permit = sem
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| VibeError::Other("failed to acquire branch scan semaphore".to_owned()))?;
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let branch = git::branch_in_dir(&path);
            TaskInfo { name, path, branch }
        }));
    }

    let mut tasks = Vec::with_capacity(handles.len());
    for h in handles {
        let info = h
            .await
            .map_err(|e| VibeError::Other(format!("branch scan join error: {e}")))?;
        tasks.push(info);
    }
    Ok(tasks)
}

/// Deletes each task independently: forced worktree removal, then branch
/// deletion when a branch was resolved. One failure never stops the batch;
/// metadata pruning runs once afterwards. Returns the per-task failures.
#[must_use]
pub fn execute(git: &Git, tasks: &[TaskInfo]) -> Vec<(String, VibeError)> {
    let mut failures = Vec::new();

    for task in tasks {
        if let Err(e) = git.remove_worktree(&task.path, true) {
            failures.push((task.name.clone(), e));
            continue;
        }
        if !task.branch.is_empty()
            && let Err(e) = git.delete_branch(&task.branch, true)
        {
            failures.push((task.name.clone(), e));
        }
    }

    let _ = git.prune_worktrees();
    failures
}
