use std::process::Command;

use vibe::core::cleanup::{self, TaskInfo};
use vibe::core::git::{self, Git};
use vibe::core::workspace;

#[test]
fn worktree_lifecycle_smoke() {
    if Command::new("git").arg("--version").output().is_err() {
        eprintln!("skipping: git not found");
        return;
    }

    let td = tempfile::tempdir().expect("tempdir");
    let repo = td.path().join("repo");
    std::fs::create_dir_all(&repo).expect("mkdir repo");

    run(&repo, &["init", "-b", "main"]);
    run(&repo, &["config", "user.email", "test@example.com"]);
    run(&repo, &["config", "user.name", "Test"]);

    std::fs::write(repo.join("README.md"), "hello\n").expect("write");
    run(&repo, &["add", "."]);
    run(&repo, &["commit", "-m", "init"]);

    let git = Git::from_dir(&repo).expect("git from dir");
    let repo_name = git.repo_name();
    assert_eq!(repo_name, "repo");

    // Use the tempdir as a stand-in for the home directory so the layout
    // under .vibe-workspaces matches production.
    let home = td.path();
    let task_path = workspace::task_path(home, &repo_name, "fix-bug");
    git.add_worktree(&task_path, "feature/fix-bug", Some("main"))
        .expect("add worktree");

    let root = workspace::workspace_root(home, &repo_name);
    assert_eq!(workspace::list_tasks(&root), vec!["fix-bug".to_owned()]);
    assert_eq!(git::branch_in_dir(&task_path), "feature/fix-bug");
    assert_eq!(
        workspace::current_task(&task_path.join("sub"), &root).as_deref(),
        Some("fix-bug")
    );

    let tasks = vec![TaskInfo {
        name: "fix-bug".to_owned(),
        path: task_path.clone(),
        branch: "feature/fix-bug".to_owned(),
    }];
    let failures = cleanup::execute(&git, &tasks);
    assert!(failures.is_empty(), "cleanup failures: {failures:?}");

    assert!(!task_path.exists());
    let branches = git.list_branch_names().expect("list branches");
    assert!(!branches.iter().any(|b| b == "feature/fix-bug"));
}

#[tokio::test]
async fn resolve_tasks_reads_branches_concurrently() {
    if Command::new("git").arg("--version").output().is_err() {
        eprintln!("skipping: git not found");
        return;
    }

    let td = tempfile::tempdir().expect("tempdir");
    let repo = td.path().join("repo");
    std::fs::create_dir_all(&repo).expect("mkdir repo");

    run(&repo, &["init", "-b", "main"]);
    run(&repo, &["config", "user.email", "test@example.com"]);
    run(&repo, &["config", "user.name", "Test"]);
    std::fs::write(repo.join("README.md"), "hello\n").expect("write");
    run(&repo, &["add", "."]);
    run(&repo, &["commit", "-m", "init"]);

    let git = Git::from_dir(&repo).expect("git from dir");
    let home = td.path();
    let root = workspace::workspace_root(home, "repo");
    for task in ["alpha", "beta"] {
        let path = workspace::task_path(home, "repo", task);
        git.add_worktree(&path, &format!("feature/{task}"), Some("main"))
            .expect("add worktree");
    }

    let names = vec!["alpha".to_owned(), "beta".to_owned()];
    let tasks = cleanup::resolve_tasks(&root, &names, 4)
        .await
        .expect("resolve");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].branch, "feature/alpha");
    assert_eq!(tasks[1].branch, "feature/beta");
}

fn run(dir: &std::path::Path, args: &[&str]) {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command");
    if !out.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
    }
}
