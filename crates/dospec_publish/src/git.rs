//! Git context discovery.
//!
//! Finds the enclosing repository, its current branch and its GitHub remote
//! so that source-built components can deploy from GitHub. Every failure is
//! soft: a missing binary, a directory outside any repository or a timed-out
//! command all mean "no git info", never an error.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use dospec_core::GitRepoInfo;
use parking_lot::Mutex;
use regex::Regex;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Branch assumed when HEAD is detached.
pub const DEFAULT_BRANCH: &str = "main";

/// Default upper bound for a single git command.
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Internal failures; logged and then discarded.
#[derive(Error, Debug)]
enum GitError {
    #[error("no repository found above {0}")]
    NotARepository(PathBuf),

    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {0} timed out")]
    Timeout(String),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

/// Source of git metadata for a publish run.
#[async_trait]
pub trait GitProvider: Send + Sync {
    /// Discover repository information for the tree containing `start`.
    async fn detect(&self, start: &Path) -> Option<GitRepoInfo>;
}

/// Git provider backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct CommandGitProvider {
    timeout: Duration,
    remote: String,
}

impl Default for CommandGitProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandGitProvider {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_GIT_TIMEOUT,
            remote: "origin".to_string(),
        }
    }

    /// Set the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a remote other than `origin`.
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Check if Git is available on the system.
    pub fn is_git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Walk upward from `start` to the first directory holding a `.git`
    /// marker. Worktrees and submodules use a `.git` file, which counts.
    pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
        // Relative starts like "." have no ancestors to walk.
        let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
        let start = if start.is_file() { start.parent()? } else { start.as_path() };
        start
            .ancestors()
            .find(|dir| dir.join(".git").exists())
            .map(Path::to_path_buf)
    }

    async fn try_detect(&self, start: &Path) -> Result<GitRepoInfo, GitError> {
        let repo_root = Self::find_repo_root(start)
            .ok_or_else(|| GitError::NotARepository(start.to_path_buf()))?;

        let branch = self.current_branch(&repo_root).await?;

        let repository = match self.remote_url(&repo_root).await {
            Ok(url) => {
                let parsed = parse_repository(&url);
                if parsed.is_none() {
                    debug!("Remote {} is not a GitHub repository", url);
                }
                parsed
            }
            Err(e) => {
                debug!("No usable remote: {}", e);
                None
            }
        };

        Ok(GitRepoInfo {
            repository,
            branch,
            repo_root,
        })
    }

    async fn current_branch(&self, repo_root: &Path) -> Result<String, GitError> {
        let branch = self.run_git(repo_root, &["branch", "--show-current"]).await?;
        if branch.is_empty() {
            debug!("Detached HEAD, assuming branch '{}'", DEFAULT_BRANCH);
            return Ok(DEFAULT_BRANCH.to_string());
        }
        Ok(branch)
    }

    async fn remote_url(&self, repo_root: &Path) -> Result<String, GitError> {
        self.run_git(repo_root, &["remote", "get-url", &self.remote])
            .await
    }

    /// Run a git command and return its trimmed stdout.
    async fn run_git(&self, repo_root: &Path, args: &[&str]) -> Result<String, GitError> {
        let command = args.join(" ");

        let child = Command::new("git")
            .args(args)
            .current_dir(repo_root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| GitError::Timeout(command.clone()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::CommandFailed { command, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl GitProvider for CommandGitProvider {
    async fn detect(&self, start: &Path) -> Option<GitRepoInfo> {
        match self.try_detect(start).await {
            Ok(info) => {
                info!(
                    "Detected git repository {} on branch {}",
                    info.repository.as_deref().unwrap_or("<no remote>"),
                    info.branch
                );
                Some(info)
            }
            Err(e) => {
                debug!("Git discovery skipped: {}", e);
                None
            }
        }
    }
}

/// Normalize a GitHub remote URL to `owner/repo`.
///
/// Accepts SCP-style (`git@github.com:owner/repo.git`), HTTPS and `ssh://`
/// forms. Remotes on other hosts yield `None`.
pub fn parse_repository(remote_url: &str) -> Option<String> {
    let caps = GITHUB_REMOTE.captures(remote_url.trim())?;
    Some(format!("{}/{}", &caps["owner"], &caps["repo"]))
}

static GITHUB_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:https?|ssh|git)://)?(?:[^@/]+@)?github\.com[:/](?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?/?$",
    )
    .expect("GitHub remote pattern is valid")
});

/// Fixed git provider for tests and offline publishing.
///
/// Returns the same answer for every start path and records each call.
#[derive(Debug, Clone, Default)]
pub struct StaticGitProvider {
    info: Option<GitRepoInfo>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl StaticGitProvider {
    pub fn new(info: Option<GitRepoInfo>) -> Self {
        Self {
            info,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider that never finds a repository.
    pub fn none() -> Self {
        Self::new(None)
    }

    /// Start paths passed to `detect`, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl GitProvider for StaticGitProvider {
    async fn detect(&self, start: &Path) -> Option<GitRepoInfo> {
        self.calls.lock().push(start.to_path_buf());
        self.info.clone()
    }
}
