//! Git integration through the `git` command line.

use async_trait::async_trait;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use autobuild_core::{
    AutobuildError, BatchResult, CommandResult, ProjectModel, RebaseParams, RepositoryHandle,
    Result, VcsIntegration,
};

/// `VcsIntegration` backed by the `git` executable.
///
/// Repositories are the work tree containing the project root plus any
/// immediate subdirectory that is itself a repository.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run git in `dir`, capturing its output.
    async fn git(&self, dir: &Path, args: &[&str]) -> Result<CommandResult> {
        debug!(dir = %dir.display(), args = ?args, "git");
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AutobuildError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }

    /// Trimmed stdout of a successful git command, `None` otherwise.
    async fn query(&self, dir: &Path, args: &[&str]) -> Option<String> {
        match self.git(dir, args).await {
            Ok(result) if result.succeeded() => {
                let value = result.stdout.trim().to_string();
                (!value.is_empty()).then_some(value)
            }
            _ => None,
        }
    }

    /// Like `git`, but a spawn failure becomes a failed result.
    async fn mutate(&self, dir: &Path, args: &[&str]) -> CommandResult {
        self.git(dir, args)
            .await
            .unwrap_or_else(|e| CommandResult::failure(-1, e.to_string()))
    }

    /// Work-tree roots under `base`, sorted and deduplicated.
    pub async fn discover(&self, base: &Path) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Some(top) = self.query(base, &["rev-parse", "--show-toplevel"]).await {
            roots.push(PathBuf::from(top));
        }

        match tokio::fs::read_dir(base).await {
            Ok(mut entries) => loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => {
                        let path = entry.path();
                        if path.is_dir() && path.join(".git").exists() {
                            roots.push(path);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(dir = %base.display(), error = %e, "Failed to scan for repositories");
                        break;
                    }
                }
            },
            Err(e) => warn!(dir = %base.display(), error = %e, "Failed to scan for repositories"),
        }

        roots.sort();
        roots.dedup();
        roots
    }

    /// Read branch, upstream and remote URL of the repository at `root`.
    pub async fn describe(&self, root: &Path) -> RepositoryHandle {
        let id = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        let (branch, upstream, url) = tokio::join!(
            self.query(root, &["symbolic-ref", "--short", "-q", "HEAD"]),
            self.query(
                root,
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"]
            ),
            self.query(root, &["remote", "get-url", "origin"]),
        );

        RepositoryHandle {
            id,
            root: root.to_path_buf(),
            current_branch: branch,
            tracked_branch: upstream,
            presentable_url: url,
        }
    }
}

#[async_trait]
impl VcsIntegration for GitCli {
    async fn is_vcs_active(&self, project: &dyn ProjectModel) -> bool {
        match project.base_path() {
            Some(base) => !self.discover(&base).await.is_empty(),
            None => false,
        }
    }

    async fn list_repositories(&self, project: &dyn ProjectModel) -> Vec<RepositoryHandle> {
        let Some(base) = project.base_path() else {
            return Vec::new();
        };
        let roots = self.discover(&base).await;
        join_all(roots.iter().map(|root| self.describe(root))).await
    }

    async fn fetch_all_remotes(&self, repositories: &[RepositoryHandle]) -> BatchResult {
        for repository in repositories {
            info!(repo = %repository.id, "Fetching all remotes");
            let result = self.mutate(&repository.root, &["fetch", "--all"]).await;
            if !result.succeeded() {
                warn!(repo = %repository.id, exit_code = result.exit_code, "git fetch failed");
                return BatchResult::failed(result.error_output());
            }
        }
        BatchResult::ok()
    }

    async fn merge(&self, repository: &RepositoryHandle, upstream: &str) -> CommandResult {
        info!(repo = %repository.id, upstream = %upstream, "git merge");
        self.mutate(&repository.root, &["merge", "--no-edit", upstream])
            .await
    }

    async fn rebase(&self, repository: &RepositoryHandle, params: &RebaseParams) -> CommandResult {
        info!(repo = %repository.id, upstream = %params.upstream, "git rebase");
        self.mutate(&repository.root, &["rebase", &params.upstream])
            .await
    }
}
