#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

/// Directory under the user's home holding one subdirectory per repository.
pub const WORKSPACES_DIR: &str = ".vibe-workspaces";

#[must_use]
pub fn workspaces_root(home: &Path) -> PathBuf {
    home.join(WORKSPACES_DIR)
}

/// Per-repository root holding that repository's task worktrees. A pure
/// function of the repository name; never created here.
#[must_use]
pub fn workspace_root(home: &Path, repo_name: &str) -> PathBuf {
    workspaces_root(home).join(repo_name)
}

#[must_use]
pub fn task_path(home: &Path, repo_name: &str, task_name: &str) -> PathBuf {
    workspace_root(home, repo_name).join(task_name)
}

/// Task the given directory is inside of, iff it is strictly below the
/// workspace root. Standing at the root itself is not "inside" a task.
#[must_use]
pub fn current_task(cwd: &Path, workspace_root: &Path) -> Option<String> {
    let rel = cwd.strip_prefix(workspace_root).ok()?;
    let first = rel.components().next()?;
    Some(first.as_os_str().to_string_lossy().into_owned())
}

/// Existing task directories under a workspace root. Non-directory entries
/// are ignored; a missing root yields an empty list, not an error.
#[must_use]
pub fn list_tasks(workspace_root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(workspace_root) else {
        return Vec::new();
    };

    let mut tasks = Vec::new();
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            tasks.push(name.to_owned());
        }
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_paths_are_deterministic() {
        let home = Path::new("/home/u");
        assert_eq!(
            workspace_root(home, "repo"),
            PathBuf::from("/home/u/.vibe-workspaces/repo")
        );
        assert_eq!(
            task_path(home, "repo", "task1"),
            PathBuf::from("/home/u/.vibe-workspaces/repo/task1")
        );
    }

    #[test]
    fn current_task_resolution() {
        let root = Path::new("/home/u/.ws/repo");
        let cases = [
            ("/home/u/.ws/repo/task1", Some("task1")),
            ("/home/u/.ws/repo/task1/src", Some("task1")),
            ("/home/u/.ws/repo/task-with-dash", Some("task-with-dash")),
            ("/home/u/other-path", None),
            ("/home/u/.ws/other-repo/task1", None),
            ("/home/u/.ws/repo", None),
        ];
        for (cwd, expected) in cases {
            assert_eq!(
                current_task(Path::new(cwd), root).as_deref(),
                expected,
                "cwd: {cwd}"
            );
        }
    }

    #[test]
    fn list_tasks_missing_root_is_empty() {
        assert!(list_tasks(Path::new("/non-existent-path-12345")).is_empty());
    }

    #[test]
    fn list_tasks_returns_directories_only() {
        let td = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(td.path().join("task1")).expect("mkdir");
        std::fs::create_dir(td.path().join("task2")).expect("mkdir");
        std::fs::write(td.path().join("notes.txt"), "").expect("write");

        let mut tasks = list_tasks(td.path());
        tasks.sort();
        assert_eq!(tasks, vec!["task1", "task2"]);
    }

    #[test]
    fn list_tasks_empty_dir_is_empty() {
        let td = tempfile::tempdir().expect("tempdir");
        assert!(list_tasks(td.path()).is_empty());
    }
}
