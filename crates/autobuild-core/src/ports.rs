//! Collaborator traits the orchestrator consumes.
//!
//! These define the seams to the host environment:
//! - `ProjectModel`: read-only project queries
//! - `VcsIntegration`: repository discovery, fetch, merge, rebase
//! - `ExternalTaskRunner`: awaitable external-system build tasks
//! - `ProcessSpawner`: external processes with streamed output
//! - `NotificationSink`: user-visible warnings and completion sound
//! - `SettingsStore`: persisted settings
//!
//! In-memory fakes for all of them live in [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::error::Result;
use crate::settings::{CompletionSound, Settings};

// ---------------------------------------------------------------------------
// ProjectModel
// ---------------------------------------------------------------------------

/// Read-only view of the project being built.
pub trait ProjectModel: Send + Sync {
    /// Display name used in logs.
    fn name(&self) -> String;

    /// Project root, if the project lives on disk.
    fn base_path(&self) -> Option<PathBuf>;

    fn is_initialized(&self) -> bool;

    /// Whether the host is indexing and cannot build yet.
    fn is_indexing(&self) -> bool;

    /// Whether the host's own Gradle sync is running.
    fn is_external_sync_in_progress(&self) -> bool {
        false
    }

    /// Root paths of linked Gradle projects, in link order.
    fn linked_gradle_projects(&self) -> Vec<PathBuf>;
}

// ---------------------------------------------------------------------------
// VcsIntegration
// ---------------------------------------------------------------------------

/// One version-controlled repository of the project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryHandle {
    /// Stable identifier, used in sync results.
    pub id: String,

    pub root: PathBuf,

    /// Checked-out local branch; `None` on detached HEAD.
    pub current_branch: Option<String>,

    /// Upstream the current branch tracks, e.g. `origin/main`.
    pub tracked_branch: Option<String>,

    pub presentable_url: Option<String>,
}

impl RepositoryHandle {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
            current_branch: None,
            tracked_branch: None,
            presentable_url: None,
        }
    }

    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.current_branch = Some(branch.into());
        self
    }

    pub fn tracking(mut self, upstream: impl Into<String>) -> Self {
        self.tracked_branch = Some(upstream.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.presentable_url = Some(url.into());
        self
    }

    /// Human-facing name: id with the current branch, else id with the URL.
    pub fn display_name(&self) -> String {
        match (&self.current_branch, &self.presentable_url) {
            (Some(branch), _) => format!("{} ({})", self.id, branch),
            (None, Some(url)) => format!("{} ({})", self.id, url),
            (None, None) => self.id.clone(),
        }
    }
}

/// Outcome of a batch operation over several repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: bool,
    pub error_message: Option<String>,
}

impl BatchResult {
    pub fn ok() -> Self {
        Self {
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error_message: Some(message.into()),
        }
    }
}

/// Exit status and captured output of one VCS command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// The tool's diagnostic text: stderr verbatim, or stdout when stderr is empty.
    pub fn error_output(&self) -> String {
        if self.stderr.trim().is_empty() {
            self.stdout.clone()
        } else {
            self.stderr.clone()
        }
    }
}

/// Parameters for rebasing the current branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseParams {
    pub upstream: String,
}

/// Version-control operations on the project's repositories.
#[async_trait]
pub trait VcsIntegration: Send + Sync {
    /// Whether version control is configured for the project at all.
    async fn is_vcs_active(&self, project: &dyn ProjectModel) -> bool;

    async fn list_repositories(&self, project: &dyn ProjectModel) -> Vec<RepositoryHandle>;

    /// Fetch every remote of every repository as one batch.
    async fn fetch_all_remotes(&self, repositories: &[RepositoryHandle]) -> BatchResult;

    async fn merge(&self, repository: &RepositoryHandle, upstream: &str) -> CommandResult;

    async fn rebase(&self, repository: &RepositoryHandle, params: &RebaseParams) -> CommandResult;
}

// ---------------------------------------------------------------------------
// ExternalTaskRunner
// ---------------------------------------------------------------------------

/// External build system a task is dispatched to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExternalSystem {
    Gradle,
    /// The host's own build ("build all modules").
    Native,
}

/// A task to run through an external system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    pub system: ExternalSystem,
    pub project_path: PathBuf,
    pub task_names: Vec<String>,
}

/// Completion of an external task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded)
    }
}

/// Runs build tasks and resolves once they finish.
#[async_trait]
pub trait ExternalTaskRunner: Send + Sync {
    async fn run_task(&self, config: &TaskConfig) -> TaskOutcome;
}

// ---------------------------------------------------------------------------
// ProcessSpawner
// ---------------------------------------------------------------------------

/// A process to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl ProcessCommand {
    pub fn new(program: impl Into<String>, working_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program and arguments joined for logging.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and the stdout lines that were streamed to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout_lines: Vec<String>,
}

impl ProcessOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Starts processes and waits for them without blocking the runtime.
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Run to completion. `Err` means the process could not be started.
    async fn start(&self, command: &ProcessCommand) -> Result<ProcessOutput>;
}

// ---------------------------------------------------------------------------
// NotificationSink / SettingsStore
// ---------------------------------------------------------------------------

/// User-visible signals.
pub trait NotificationSink: Send + Sync {
    fn notify_warning(&self, title: &str, message: &str);

    fn play_completion_sound(&self, sound: CompletionSound);
}

/// Read-only access to persisted settings.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings>;
}
