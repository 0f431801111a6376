//! In-memory fakes for the collaborator traits (testing only).
//!
//! Provides `FakeProject`, `FakeVcs`, `FakeTaskRunner`, `FakeProcessSpawner`,
//! `RecordingNotifier` and `StaticSettings`, which satisfy the trait
//! contracts without touching the filesystem, git, or any build tool.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::error::{AutobuildError, Result};
use crate::ports::*;
use crate::settings::{CompletionSound, Settings};

// ---------------------------------------------------------------------------
// FakeProject
// ---------------------------------------------------------------------------

/// Project whose readiness flags can be flipped from another task.
#[derive(Debug, Clone)]
pub struct FakeProject {
    name: String,
    base: Option<PathBuf>,
    initialized: Arc<AtomicBool>,
    indexing: Arc<AtomicBool>,
    external_sync: Arc<AtomicBool>,
    gradle_projects: Vec<PathBuf>,
    gradle_lookups: Option<Arc<AtomicUsize>>,
}

impl FakeProject {
    /// Ready project rooted at `base`.
    pub fn at(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
            ..Self::detached()
        }
    }

    /// Ready project with no base path.
    pub fn detached() -> Self {
        Self {
            name: "fake-project".to_string(),
            base: None,
            initialized: Arc::new(AtomicBool::new(true)),
            indexing: Arc::new(AtomicBool::new(false)),
            external_sync: Arc::new(AtomicBool::new(false)),
            gradle_projects: Vec::new(),
            gradle_lookups: None,
        }
    }

    pub fn with_gradle_project(mut self, path: impl Into<PathBuf>) -> Self {
        self.gradle_projects.push(path.into());
        self
    }

    /// Linked Gradle projects disappear after `lookups` queries, as when
    /// the link is removed between detection and build.
    pub fn unlink_gradle_after(mut self, lookups: usize) -> Self {
        self.gradle_lookups = Some(Arc::new(AtomicUsize::new(lookups)));
        self
    }

    pub fn initialized(self, value: bool) -> Self {
        self.initialized.store(value, Ordering::SeqCst);
        self
    }

    pub fn indexing(self, value: bool) -> Self {
        self.indexing.store(value, Ordering::SeqCst);
        self
    }

    pub fn external_sync(self, value: bool) -> Self {
        self.external_sync.store(value, Ordering::SeqCst);
        self
    }

    pub fn initialized_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.initialized)
    }

    pub fn indexing_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.indexing)
    }
}

impl ProjectModel for FakeProject {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn base_path(&self) -> Option<PathBuf> {
        self.base.clone()
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::SeqCst)
    }

    fn is_external_sync_in_progress(&self) -> bool {
        self.external_sync.load(Ordering::SeqCst)
    }

    fn linked_gradle_projects(&self) -> Vec<PathBuf> {
        if let Some(remaining) = &self.gradle_lookups {
            let spent = remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err();
            if spent {
                return Vec::new();
            }
        }
        self.gradle_projects.clone()
    }
}

// ---------------------------------------------------------------------------
// FakeVcs
// ---------------------------------------------------------------------------

/// A recorded VCS invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Fetch(Vec<String>),
    Merge { repo: String, upstream: String },
    Rebase { repo: String, upstream: String },
}

/// Scripted VCS: per-repository outcomes, everything else succeeds.
#[derive(Debug)]
pub struct FakeVcs {
    active: bool,
    repositories: Vec<RepositoryHandle>,
    fetch: BatchResult,
    outcomes: HashMap<String, CommandResult>,
    calls: Mutex<Vec<VcsCall>>,
}

impl Default for FakeVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeVcs {
    pub fn new() -> Self {
        Self {
            active: true,
            repositories: Vec::new(),
            fetch: BatchResult::ok(),
            outcomes: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_repository(mut self, repository: RepositoryHandle) -> Self {
        self.repositories.push(repository);
        self
    }

    pub fn failing_fetch(mut self, message: impl Into<String>) -> Self {
        self.fetch = BatchResult::failed(message);
        self
    }

    /// Result returned for merge/rebase of `repo_id`.
    pub fn with_outcome(mut self, repo_id: impl Into<String>, result: CommandResult) -> Self {
        self.outcomes.insert(repo_id.into(), result);
        self
    }

    pub fn repositories(&self) -> &[RepositoryHandle] {
        &self.repositories
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of merge/rebase calls, i.e. working-tree mutations.
    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, VcsCall::Fetch(_)))
            .count()
    }

    fn outcome(&self, repo_id: &str) -> CommandResult {
        self.outcomes
            .get(repo_id)
            .cloned()
            .unwrap_or_else(CommandResult::success)
    }
}

#[async_trait]
impl VcsIntegration for FakeVcs {
    async fn is_vcs_active(&self, _project: &dyn ProjectModel) -> bool {
        self.active
    }

    async fn list_repositories(&self, _project: &dyn ProjectModel) -> Vec<RepositoryHandle> {
        self.repositories.clone()
    }

    async fn fetch_all_remotes(&self, repositories: &[RepositoryHandle]) -> BatchResult {
        self.calls.lock().unwrap().push(VcsCall::Fetch(
            repositories.iter().map(|r| r.id.clone()).collect(),
        ));
        self.fetch.clone()
    }

    async fn merge(&self, repository: &RepositoryHandle, upstream: &str) -> CommandResult {
        self.calls.lock().unwrap().push(VcsCall::Merge {
            repo: repository.id.clone(),
            upstream: upstream.to_string(),
        });
        self.outcome(&repository.id)
    }

    async fn rebase(&self, repository: &RepositoryHandle, params: &RebaseParams) -> CommandResult {
        self.calls.lock().unwrap().push(VcsCall::Rebase {
            repo: repository.id.clone(),
            upstream: params.upstream.clone(),
        });
        self.outcome(&repository.id)
    }
}

// ---------------------------------------------------------------------------
// FakeTaskRunner
// ---------------------------------------------------------------------------

/// Task runner returning queued outcomes, then a default.
///
/// With a gate, each task waits for one semaphore permit before finishing,
/// which lets tests hold a run mid-build.
#[derive(Debug)]
pub struct FakeTaskRunner {
    queue: Mutex<VecDeque<TaskOutcome>>,
    default: TaskOutcome,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<TaskConfig>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTaskRunner {
    fn with_default(default: TaskOutcome) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default,
            gate: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_default(TaskOutcome::Succeeded)
    }

    pub fn failing(detail: impl Into<String>) -> Self {
        Self::with_default(TaskOutcome::Failed(detail.into()))
    }

    /// Outcomes for the next calls, in order.
    pub fn then(self, outcomes: impl IntoIterator<Item = TaskOutcome>) -> Self {
        self.queue.lock().unwrap().extend(outcomes);
        self
    }

    /// Block each task until a permit is added to the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn calls(&self) -> Vec<TaskConfig> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of tasks that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalTaskRunner for FakeTaskRunner {
    async fn run_task(&self, config: &TaskConfig) -> TaskOutcome {
        self.calls.lock().unwrap().push(config.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

// ---------------------------------------------------------------------------
// FakeProcessSpawner
// ---------------------------------------------------------------------------

/// Process spawner with a fixed exit code, or one that cannot spawn.
#[derive(Debug)]
pub struct FakeProcessSpawner {
    exit_code: Option<i32>,
    calls: Mutex<Vec<ProcessCommand>>,
}

impl FakeProcessSpawner {
    pub fn exiting(exit_code: i32) -> Self {
        Self {
            exit_code: Some(exit_code),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every start fails as if the program were not installed.
    pub fn unspawnable() -> Self {
        Self {
            exit_code: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessSpawner for FakeProcessSpawner {
    async fn start(&self, command: &ProcessCommand) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(command.clone());
        match self.exit_code {
            Some(exit_code) => Ok(ProcessOutput {
                exit_code,
                stdout_lines: vec![format!("[fake] {}", command.display())],
            }),
            None => Err(AutobuildError::Spawn {
                program: command.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier / StaticSettings
// ---------------------------------------------------------------------------

/// Records every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    warnings: Mutex<Vec<(String, String)>>,
    sounds: Mutex<Vec<CompletionSound>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(title, message)` pairs in emission order.
    pub fn warnings(&self) -> Vec<(String, String)> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn sounds(&self) -> Vec<CompletionSound> {
        self.sounds.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify_warning(&self, title: &str, message: &str) {
        self.warnings
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }

    fn play_completion_sound(&self, sound: CompletionSound) {
        self.sounds.lock().unwrap().push(sound);
    }
}

/// Settings store returning fixed settings, or a fixed error.
#[derive(Debug)]
pub struct StaticSettings {
    settings: Option<Settings>,
}

impl StaticSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
        }
    }

    /// A store whose `load` always fails.
    pub fn broken() -> Self {
        Self { settings: None }
    }
}

impl SettingsStore for StaticSettings {
    fn load(&self) -> Result<Settings> {
        self.settings
            .clone()
            .ok_or_else(|| AutobuildError::Settings("settings unavailable".to_string()))
    }
}
