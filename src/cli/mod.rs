#![forbid(unsafe_code)]

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand};

use crate::agent;
use crate::config;
use crate::core::cleanup;
use crate::core::ghq;
use crate::core::git::{self, Git};
use crate::core::naming::sanitize_task_name;
use crate::core::siblings;
use crate::core::workspace;
use crate::error::VibeError;
use crate::output::statusline::{StatusInput, format_status};
use crate::output::table::Table;
use crate::project::{self, ProjectConfig, RepoConfig};
use crate::registry;
use crate::tui::picker::{self, PickerItem};

#[derive(Debug, Parser)]
#[command(
    name = "vibe",
    version,
    about = "Task workspace manager built on git worktrees"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a task workspace and start an agent session in it
    New(NewArgs),
    /// Select and delete finished task workspaces
    Cleanup,
    /// Diff the workspace against the base branch of its session
    Diff,
    /// Locate sibling workspaces of the current branch across repositories
    Repos(ReposArgs),
    /// Create .vibe-project.json interactively
    CreateProject,
    /// Output a status line from JSON input on stdin
    Statusline,
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct NewArgs {
    /// Base branch for the primary repository (defaults to the remote's
    /// default branch)
    #[arg(short = 'b', long = "base")]
    pub base: Option<String>,
    /// Branch prefix override
    #[arg(short = 'p', long = "prefix")]
    pub prefix: Option<String>,
    /// Also create workspaces in additional repositories
    #[arg(short = 'm', long = "multi")]
    pub multi: bool,
    /// Task name (sanitized to [A-Za-z0-9_-])
    pub task: String,
}

#[derive(Debug, Parser)]
pub struct ReposArgs {
    /// Output in JSON format
    #[arg(long = "json")]
    pub json: bool,
    /// Output in CSV format
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        Commands::New(args) => cmd_new(args).await,
        Commands::Cleanup => cmd_cleanup().await,
        Commands::Diff => cmd_diff(),
        Commands::Repos(args) => cmd_repos(args).await,
        Commands::CreateProject => cmd_create_project().await,
        Commands::Statusline => cmd_statusline(),
        Commands::Config(args) => match args.cmd {
            ConfigCmd::List => {
                print!("{}", config::list_resolved_toml()?);
                Ok(ExitCode::SUCCESS)
            }
        },
        Commands::Completion(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "vibe", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => Ok(cmd_version()),
    }
}

async fn load_cfg() -> anyhow::Result<config::Config> {
    let cfg = tokio::task::spawn_blocking(config::load).await??;
    Ok(cfg)
}

fn home_dir() -> anyhow::Result<PathBuf> {
    config::home_dir().context("failed to determine home directory")
}

async fn cmd_new(args: NewArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg().await?;

    let task = sanitize_task_name(&args.task);
    if task.is_empty() {
        return Err(VibeError::InvalidTaskName(args.task).into());
    }

    let git = Git::from_cwd()?;
    let repo_name = git.repo_name();
    let home = home_dir()?;
    let prefix = args
        .prefix
        .unwrap_or_else(|| cfg.workspace.branch_prefix.clone());
    let branch = format!("{prefix}{task}");
    let worktree_path = workspace::task_path(&home, &repo_name, &task);

    let sibling_paths = if args.multi {
        create_additional_workspaces(&cfg, &git, &home, &task, &prefix).await?
    } else {
        Vec::new()
    };

    // Explicit -b applies to the primary repository only.
    let base = args.base.unwrap_or_else(|| git.default_branch());

    println!("Creating worktree at {}...", worktree_path.display());
    git.add_worktree(&worktree_path, &branch, Some(&base))
        .context("failed to create worktree")?;

    copy_aux_files(&cfg, git.repo_root(), &worktree_path);
    setup_workspace_environment(&cfg, &home, &worktree_path);

    println!("Worktree created at {}", worktree_path.display());
    println!("Branch: {branch}");

    if agent::command_exists(&cfg.agent.executable) {
        agent::launch_session(&cfg.agent.executable, &worktree_path, &sibling_paths, &base)?;
    } else {
        eprintln!("Warning: {} not installed", cfg.agent.executable);
    }
    Ok(ExitCode::SUCCESS)
}

/// Creates one task workspace per additional repository, sequentially so
/// warnings name an identifiable repository. Any single repository failing
/// is skipped, never fatal.
async fn create_additional_workspaces(
    cfg: &config::Config,
    primary: &Git,
    home: &Path,
    task: &str,
    prefix: &str,
) -> anyhow::Result<Vec<String>> {
    let plan: Vec<(PathBuf, Option<RepoConfig>)> =
        match project::load(primary.repo_root())? {
            Some(pcfg) => {
                let ghq_root = ghq::ghq_root()?;
                pcfg.repos
                    .into_iter()
                    .map(|(id, rc)| (ghq_root.join(id), Some(rc)))
                    .collect()
            }
            None => select_additional_repos(primary.repo_root())?
                .into_iter()
                .map(|root| (root, None))
                .collect(),
        };

    if plan.is_empty() {
        println!("No additional repositories selected");
        return Ok(Vec::new());
    }

    create_planned_workspaces(cfg, primary, home, task, prefix, plan)
}

fn create_planned_workspaces(
    cfg: &config::Config,
    primary: &Git,
    home: &Path,
    task: &str,
    prefix: &str,
    plan: Vec<(PathBuf, Option<RepoConfig>)>,
) -> anyhow::Result<Vec<String>> {
    let mut created = Vec::new();
    for (root, repo_cfg) in plan {
        let repo_git = match Git::from_dir(&root) {
            Ok(g) => g,
            Err(e) => {
                eprintln!("Warning: skipping {}: {e}", root.display());
                continue;
            }
        };
        // The primary repository must never double as one of its own
        // additional repositories, even when the project config lists it.
        if repo_git.repo_root() == primary.repo_root() {
            continue;
        }
        let repo_name = repo_git.repo_name();

        // A configured defaultTarget always wins; interactive selection is
        // offered only when the project carries no configuration.
        let picked = if repo_cfg.is_none() {
            pick_branch(&repo_git, &repo_name)?
        } else {
            None
        };
        let configured = repo_cfg.as_ref().and_then(|rc| rc.default_target.clone());
        let base = resolve_additional_base(
            configured.as_deref(),
            picked.as_deref(),
            &repo_git.default_branch(),
        );

        let path = workspace::task_path(home, &repo_name, task);
        let repo_branch = format!("{prefix}{task}");
        if let Err(e) = repo_git.add_worktree(&path, &repo_branch, Some(&base)) {
            eprintln!("Warning: failed to create worktree for {repo_name}: {e}");
            continue;
        }

        copy_aux_files(cfg, repo_git.repo_root(), &path);
        if let Some(setup) = repo_cfg.as_ref().and_then(|rc| rc.setup_command.as_deref())
            && !agent::run_setup_command(setup, &path)
        {
            eprintln!("Warning: setup command failed for {repo_name}");
        }
        setup_workspace_environment(cfg, home, &path);

        println!("Created worktree: {}", path.display());
        created.push(path.to_string_lossy().into_owned());
    }

    Ok(created)
}

fn select_additional_repos(primary_root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let candidates: Vec<PathBuf> = ghq::list_repo_paths()?
        .into_iter()
        .filter(|p| p != primary_root)
        .collect();
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<PickerItem> = candidates
        .iter()
        .map(|p| PickerItem {
            label: p.to_string_lossy().into_owned(),
            detail: format!("Repository checkout:\n{}", p.display()),
        })
        .collect();
    let indices = picker::pick_many("Select additional repos", &items)?;
    Ok(indices.into_iter().map(|i| candidates[i].clone()).collect())
}

fn pick_branch(repo_git: &Git, repo_name: &str) -> anyhow::Result<Option<String>> {
    let branches = repo_git.list_branch_names()?;
    if branches.is_empty() {
        return Ok(None);
    }

    let items: Vec<PickerItem> = branches
        .iter()
        .map(|b| PickerItem {
            label: b.clone(),
            detail: format!("Branch: {b}\nRepository: {repo_name}"),
        })
        .collect();
    let idx = picker::pick_one(&format!("Select branch for {repo_name}"), &items)?;
    Ok(idx.map(|i| strip_origin_prefix(&branches[i]).to_owned()))
}

fn resolve_additional_base(configured: Option<&str>, picked: Option<&str>, fallback: &str) -> String {
    configured.or(picked).unwrap_or(fallback).to_owned()
}

fn strip_origin_prefix(branch: &str) -> &str {
    branch.strip_prefix("origin/").unwrap_or(branch)
}

/// Replicates the configured auxiliary files into the new workspace. A file
/// missing at the source is not an error; a copy failure is a warning.
fn copy_aux_files(cfg: &config::Config, src_root: &Path, dst_root: &Path) {
    for file in &cfg.workspace.files_to_copy {
        if let Err(e) = copy_if_exists(&src_root.join(file), &dst_root.join(file)) {
            eprintln!("Warning: failed to copy {file}: {e}");
        }
    }
}

fn copy_if_exists(src: &Path, dst: &Path) -> anyhow::Result<()> {
    let data = match std::fs::read(src) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", src.display())),
    };
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(dst, data).with_context(|| format!("failed to write {}", dst.display()))
}

fn setup_workspace_environment(cfg: &config::Config, home: &Path, workspace_path: &Path) {
    if agent::command_exists(&cfg.agent.direnv_executable) {
        agent::allow_direnv(&cfg.agent.direnv_executable, workspace_path);
    } else {
        eprintln!(
            "Warning: {} not installed, skipping direnv allow",
            cfg.agent.direnv_executable
        );
    }
    // A missing or malformed registry is an expected steady state.
    let _ = registry::register_workspace(home, workspace_path);
}

async fn cmd_cleanup() -> anyhow::Result<ExitCode> {
    let cfg = load_cfg().await?;
    let git = Git::from_cwd()?;
    let repo_name = git.repo_name();
    let home = home_dir()?;
    let root = workspace::workspace_root(&home, &repo_name);

    if workspace::list_tasks(&root).is_empty() {
        println!("No tasks found");
        return Ok(ExitCode::SUCCESS);
    }

    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let candidates = cleanup::candidate_tasks(&root, &cwd);
    if candidates.is_empty() {
        println!("No tasks available for cleanup (only current task exists)");
        return Ok(ExitCode::SUCCESS);
    }

    let items: Vec<PickerItem> = candidates
        .iter()
        .map(|name| PickerItem {
            label: name.clone(),
            detail: format!("Task: {name}\nPath: {}", root.join(name).display()),
        })
        .collect();
    let indices = picker::pick_many("Select tasks to delete", &items)?;
    let selected: Vec<String> = indices.into_iter().map(|i| candidates[i].clone()).collect();
    if selected.is_empty() {
        println!("No tasks selected");
        return Ok(ExitCode::SUCCESS);
    }

    let tasks = cleanup::resolve_tasks(&root, &selected, cfg.workspace.scan_concurrency).await?;

    if !confirm_deletion(&tasks)? {
        println!("Aborted");
        return Ok(ExitCode::SUCCESS);
    }

    for task in &tasks {
        println!("Removing {}...", task.name);
    }
    let failures = cleanup::execute(&git, &tasks);
    for (name, err) in &failures {
        eprintln!("Warning: failed to remove {name}: {err}");
    }

    println!("Done");
    Ok(ExitCode::SUCCESS)
}

/// One yes/no gate for the whole batch; declining leaves everything intact.
fn confirm_deletion(tasks: &[cleanup::TaskInfo]) -> anyhow::Result<bool> {
    println!("The following tasks will be deleted:");
    for task in tasks {
        println!("  - {} (branch: {})", task.name, task.branch);
    }
    print!("Are you sure? [y/N] ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    let _ = std::io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn cmd_diff() -> anyhow::Result<ExitCode> {
    let Some(base) = diff_base(std::env::var(agent::ENV_BASE_BRANCH).ok()) else {
        anyhow::bail!(
            "{} is not set; run this inside a session started by `vibe new`",
            agent::ENV_BASE_BRANCH
        );
    };
    let git = Git::from_cwd()?;
    git.show_range_diff(&base)?;
    Ok(ExitCode::SUCCESS)
}

fn diff_base(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn cmd_repos(args: ReposArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg().await?;
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let branch = git::branch_in_dir(&cwd);
    if branch.is_empty() {
        anyhow::bail!("not on a git branch");
    }

    let home = home_dir()?;
    let root = workspace::workspaces_root(&home);
    let matches = siblings::find_siblings(&root, &branch, cfg.workspace.scan_concurrency).await?;

    if matches.is_empty() {
        println!("No repositories found for branch: {branch}");
        return Ok(ExitCode::SUCCESS);
    }

    if args.json {
        let mut out = serde_json::to_string_pretty(&matches)?;
        out.push('\n');
        print!("{out}");
        return Ok(ExitCode::SUCCESS);
    }

    let mut t = Table::new(["REPOSITORY", "PATH"]);
    for m in &matches {
        t.row([m.repository.clone(), m.path.clone()]);
    }
    if args.csv {
        t.write_csv()?;
    } else {
        t.print()?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_create_project() -> anyhow::Result<ExitCode> {
    let repos = ghq::list_repos()?;
    let ghq_root = ghq::ghq_root()?;

    let items: Vec<PickerItem> = repos
        .iter()
        .map(|id| PickerItem {
            label: id.clone(),
            detail: format!("Repository: {id}\nPath: {}", ghq_root.join(id).display()),
        })
        .collect();
    let indices = picker::pick_many("Select repos for project", &items)?;
    if indices.is_empty() {
        println!("No repositories selected.");
        return Ok(ExitCode::SUCCESS);
    }

    let mut pcfg = ProjectConfig::default();
    let mut repo_names = Vec::new();
    for idx in indices {
        let id = &repos[idx];
        let repo_name = id.rsplit('/').next().unwrap_or(id).to_owned();
        println!("\nConfiguring {repo_name}...");

        let default_target = match Git::from_dir(&ghq_root.join(id)) {
            Ok(repo_git) => pick_branch(&repo_git, &repo_name)?,
            Err(e) => {
                eprintln!("Warning: skipping branch selection for {repo_name}: {e}");
                None
            }
        };

        pcfg.repos.insert(
            id.clone(),
            RepoConfig {
                default_target,
                setup_command: None,
            },
        );
        repo_names.push(repo_name);
    }

    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let count = pcfg.repos.len();
    project::save(&cwd, &pcfg)?;
    project::update_gitignore(&cwd.join(".gitignore"), &repo_names)?;

    println!(
        "\nCreated {} with {count} repositories.",
        project::PROJECT_CONFIG_FILE
    );
    println!("Edit the file to configure setupCommand for each repo.");
    Ok(ExitCode::SUCCESS)
}

fn cmd_statusline() -> anyhow::Result<ExitCode> {
    let input = std::io::read_to_string(std::io::stdin())?;
    if input.trim().is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let data: StatusInput =
        serde_json::from_str(&input).context("failed to parse JSON input")?;

    let current_dir = data.workspace.current_dir.unwrap_or_default();
    let branch = if current_dir.is_empty() {
        String::new()
    } else {
        git::branch_in_dir(Path::new(&current_dir))
    };

    println!(
        "{}",
        format_status(
            data.model.display_name.as_deref(),
            &config::tilde_path(&current_dir),
            &branch,
            data.context_window.used_percentage,
        )
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_version() -> ExitCode {
    println!("vibe version {}", env!("CARGO_PKG_VERSION"));
    if let Some(commit) = option_env!("VIBE_GIT_COMMIT") {
        println!("  commit: {commit}");
    }
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_target_beats_interactive_default() {
        assert_eq!(
            resolve_additional_base(Some("develop"), Some("picked"), "main"),
            "develop"
        );
        assert_eq!(
            resolve_additional_base(None, Some("picked"), "main"),
            "picked"
        );
        assert_eq!(resolve_additional_base(None, None, "main"), "main");
    }

    #[test]
    fn strips_origin_prefix_for_worktree_bases() {
        assert_eq!(strip_origin_prefix("origin/develop"), "develop");
        assert_eq!(strip_origin_prefix("develop"), "develop");
        assert_eq!(strip_origin_prefix("feature/origin-x"), "feature/origin-x");
    }

    #[test]
    fn copy_if_exists_skips_missing_and_creates_dirs() {
        let td = tempfile::tempdir().expect("tempdir");
        let src_root = td.path().join("src");
        let dst_root = td.path().join("dst");
        std::fs::create_dir_all(src_root.join(".claude")).expect("mkdir");
        std::fs::write(src_root.join(".claude").join("settings.local.json"), "{}")
            .expect("write");

        copy_if_exists(
            &src_root.join(".envrc"),
            &dst_root.join(".envrc"),
        )
        .expect("missing source is not an error");
        assert!(!dst_root.join(".envrc").exists());

        copy_if_exists(
            &src_root.join(".claude/settings.local.json"),
            &dst_root.join(".claude/settings.local.json"),
        )
        .expect("copy");
        assert_eq!(
            std::fs::read_to_string(dst_root.join(".claude/settings.local.json"))
                .expect("read"),
            "{}"
        );
    }

    #[test]
    fn diff_requires_base_branch_from_session() {
        assert_eq!(diff_base(None), None);
        assert_eq!(diff_base(Some(String::new())), None);
        assert_eq!(diff_base(Some("  ".to_owned())), None);
        assert_eq!(diff_base(Some("main".to_owned())), Some("main".to_owned()));
    }

    #[test]
    fn planned_workspaces_skip_the_primary_repository() {
        if std::process::Command::new("git")
            .arg("--version")
            .output()
            .is_err()
        {
            eprintln!("skipping: git not found");
            return;
        }

        let td = tempfile::tempdir().expect("tempdir");
        let home = td.path();
        let primary_root = init_repo(home, "primary");
        let other_root = init_repo(home, "other");

        let primary = Git::from_dir(&primary_root).expect("primary git");
        let cfg = config::Config::default();
        let repo_cfg = RepoConfig {
            default_target: Some("main".to_owned()),
            setup_command: None,
        };
        // A project config that lists the primary repository alongside a
        // genuinely additional one.
        let plan = vec![
            (primary_root.clone(), Some(repo_cfg.clone())),
            (other_root, Some(repo_cfg)),
        ];

        let created = create_planned_workspaces(&cfg, &primary, home, "task1", "feature/", plan)
            .expect("create");

        let other_task = crate::core::workspace::task_path(home, "other", "task1");
        assert_eq!(created, vec![other_task.to_string_lossy().into_owned()]);
        assert!(other_task.is_dir());
        assert!(!crate::core::workspace::task_path(home, "primary", "task1").exists());

        // The primary's branch is still free for the primary worktree.
        let branches = primary.list_branch_names().expect("branches");
        assert!(!branches.iter().any(|b| b == "feature/task1"));
    }

    fn init_repo(base: &std::path::Path, name: &str) -> PathBuf {
        let repo = base.join(name);
        std::fs::create_dir_all(&repo).expect("mkdir repo");
        for args in [
            vec!["init", "-b", "main"],
            vec!["config", "user.email", "test@example.com"],
            vec!["config", "user.name", "Test"],
        ] {
            run_git(&repo, &args);
        }
        std::fs::write(repo.join("README.md"), "hello\n").expect("write");
        run_git(&repo, &["add", "."]);
        run_git(&repo, &["commit", "-m", "init"]);
        repo
    }

    fn run_git(dir: &std::path::Path, args: &[&str]) {
        let out = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("git command");
        assert!(
            out.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
    }

    #[test]
    fn cli_parses_new_flags() {
        let cli = Cli::try_parse_from(["vibe", "new", "-b", "develop", "-m", "Fix Bug #42"])
            .expect("parse");
        match cli.cmd {
            Commands::New(args) => {
                assert_eq!(args.base.as_deref(), Some("develop"));
                assert!(args.multi);
                assert_eq!(args.task, "Fix Bug #42");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
