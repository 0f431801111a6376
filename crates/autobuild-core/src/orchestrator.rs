//! The build orchestration state machine.
//!
//! ```text
//! NotStarted -> Building1 -> Syncing -> Building2 -> Done
//! ```
//!
//! Every step runs regardless of how the previous one went: a failed first
//! build still fetches remotes, a failed sync still builds again, and the
//! completion signal fires at `Done` whatever happened. At most one run is
//! active per orchestrator; triggers arriving while a run is active are
//! dropped, not queued.

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::capabilities::{HostCapabilities, HostFeature};
use crate::detector::BuildSystemDetector;
use crate::domain::{
    BuildPhase, BuildPhaseResult, GitSyncStrategy, RepositorySyncResult, RunOutcome, RunReport,
    RunState, RunStep, SyncSkipReason, Trigger,
};
use crate::git_sync::GitSyncExecutor;
use crate::obs::{
    emit_phase_finished, emit_run_finished, emit_run_started, emit_step_entered,
    emit_trigger_dropped, run_span,
};
use crate::ports::{
    ExternalTaskRunner, NotificationSink, ProcessSpawner, ProjectModel, RepositoryHandle,
    SettingsStore, VcsIntegration,
};
use crate::readiness::wait_until_ready;
use crate::runners::{runner_for, BuildRunner, RunnerContext};
use crate::settings::Settings;

/// Title of the warning raised for each repository that failed to sync.
pub const SYNC_WARNING_TITLE: &str = "Git sync failed";

/// Body of the sync warning for `repository`.
pub fn sync_warning_message(repository: &str, error: &str) -> String {
    format!(
        "Git operations failed for {repository}. Please update project manually.\nError: {error}"
    )
}

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub project: Arc<dyn ProjectModel>,
    pub capabilities: Arc<dyn HostCapabilities>,
    pub vcs: Arc<dyn VcsIntegration>,
    pub tasks: Arc<dyn ExternalTaskRunner>,
    pub spawner: Arc<dyn ProcessSpawner>,
    pub notifier: Arc<dyn NotificationSink>,
    pub settings: Arc<dyn SettingsStore>,
}

/// Releases the run guard when dropped, so a panicking phase cannot wedge
/// the orchestrator.
struct RunGuard {
    state: Arc<Mutex<RunState>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock(&self.state).release();
    }
}

fn lock(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drives detect -> build -> sync -> build -> notify for one project.
pub struct BuildOrchestrator {
    collaborators: Collaborators,
    state: Arc<Mutex<RunState>>,
}

impl BuildOrchestrator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            state: Arc::new(Mutex::new(RunState::new())),
        }
    }

    pub fn current_step(&self) -> RunStep {
        lock(&self.state).current_step()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).is_running()
    }

    /// Whether this host starts runs from `trigger`.
    ///
    /// Hosts with a sync listener start runs when their project sync
    /// finishes, so the project-opened event is left to that listener.
    pub fn accepts(&self, trigger: Trigger) -> bool {
        !(trigger == Trigger::ProjectOpened
            && self
                .collaborators
                .capabilities
                .supports_feature(HostFeature::SyncListener))
    }

    fn acquire(&self, trigger: Trigger) -> Option<RunGuard> {
        if !self.accepts(trigger) {
            emit_trigger_dropped(trigger, "host starts runs from sync events");
            return None;
        }
        if !lock(&self.state).try_acquire() {
            emit_trigger_dropped(trigger, "run already in progress");
            return None;
        }
        Some(RunGuard {
            state: Arc::clone(&self.state),
        })
    }

    /// Run the pipeline to `Done` on the current task.
    ///
    /// Returns `Dropped` without doing anything when a run is already active.
    pub async fn run(&self, trigger: Trigger) -> RunOutcome {
        let Some(guard) = self.acquire(trigger) else {
            return RunOutcome::Dropped;
        };
        let report = self.execute(trigger).await;
        drop(guard);
        RunOutcome::Completed(Box::new(report))
    }

    /// Start the pipeline on a background tokio task.
    ///
    /// The guard is taken before this returns, so a trigger arriving right
    /// after sees the run as active.
    pub fn trigger(self: &Arc<Self>, trigger: Trigger) -> Option<JoinHandle<RunReport>> {
        let guard = self.acquire(trigger)?;
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let report = this.execute(trigger).await;
            drop(guard);
            report
        }))
    }

    async fn execute(&self, trigger: Trigger) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = run_span(&run_id.to_string(), &self.collaborators.project.name());
        self.execute_steps(run_id, trigger).instrument(span).await
    }

    async fn execute_steps(&self, run_id: Uuid, trigger: Trigger) -> RunReport {
        let c = &self.collaborators;
        let id = run_id.to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        let settings = self.load_settings();

        if trigger.is_sync_event() && settings.trigger_delay_ms > 0 {
            tokio::time::sleep(settings.trigger_delay()).await;
        }

        // Building1
        self.enter(&id, RunStep::Building1);
        let build_system = BuildSystemDetector::new(c.capabilities.as_ref()).detect(c.project.as_ref());
        emit_run_started(&id, trigger, build_system.name());
        let runner = runner_for(
            build_system,
            &RunnerContext {
                project: Arc::clone(&c.project),
                tasks: Arc::clone(&c.tasks),
                spawner: Arc::clone(&c.spawner),
            },
            &settings.build,
        );
        let mut readiness_failed = false;
        let first_build = self
            .build(&id, runner.as_ref(), BuildPhase::First, &settings, &mut readiness_failed)
            .await;

        // Syncing
        self.enter(&id, RunStep::Syncing);
        let (sync_results, sync_skipped) = self.sync(settings.git_sync).await;

        // Building2
        self.enter(&id, RunStep::Building2);
        let second_build = self
            .build(&id, runner.as_ref(), BuildPhase::Second, &settings, &mut readiness_failed)
            .await;

        // Done
        self.enter(&id, RunStep::Done);
        if !settings.sound.is_silent() {
            c.notifier.play_completion_sound(settings.sound);
        }

        let report = RunReport {
            run_id,
            trigger,
            build_system,
            strategy: settings.git_sync,
            first_build,
            sync_results,
            sync_skipped,
            second_build,
            started_at,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        emit_run_finished(
            &id,
            report.duration_ms,
            report.failed_repositories().count(),
            report.fully_succeeded(),
        );
        report
    }

    fn load_settings(&self) -> Settings {
        match self.collaborators.settings.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to load settings; using defaults");
                Settings::default()
            }
        }
    }

    fn enter(&self, run_id: &str, step: RunStep) {
        if let Err(e) = lock(&self.state).advance(step) {
            error!(error = %e, "Run step out of sequence");
            return;
        }
        emit_step_entered(run_id, step);
    }

    async fn build(
        &self,
        run_id: &str,
        runner: &dyn BuildRunner,
        phase: BuildPhase,
        settings: &Settings,
        readiness_failed: &mut bool,
    ) -> BuildPhaseResult {
        let c = &self.collaborators;
        let result = if !settings.readiness.enabled {
            runner.run(phase).await
        } else if *readiness_failed {
            warn!(phase = %phase, "Skipping build: project readiness already timed out");
            BuildPhaseResult::skipped(phase, "project readiness timed out earlier in this run")
        } else {
            match wait_until_ready(c.project.as_ref(), c.capabilities.as_ref(), &settings.readiness)
                .await
            {
                Ok(()) => runner.run(phase).await,
                Err(e) => {
                    *readiness_failed = true;
                    warn!(phase = %phase, error = %e, "Skipping build: project not ready");
                    BuildPhaseResult::skipped(phase, e.to_string())
                }
            }
        };
        emit_phase_finished(run_id, &result);
        result
    }

    async fn sync(
        &self,
        strategy: GitSyncStrategy,
    ) -> (Vec<RepositorySyncResult>, Option<SyncSkipReason>) {
        let c = &self.collaborators;

        if strategy == GitSyncStrategy::None {
            info!("Git sync disabled");
            return (Vec::new(), Some(SyncSkipReason::StrategyNone));
        }
        if !c.capabilities.supports_feature(HostFeature::GitIntegration)
            || !c.vcs.is_vcs_active(c.project.as_ref()).await
        {
            info!("Git is not active for this project; skipping sync");
            return (Vec::new(), Some(SyncSkipReason::VcsInactive));
        }

        let repositories = c.vcs.list_repositories(c.project.as_ref()).await;
        if repositories.is_empty() {
            info!("No git repositories; skipping sync");
            return (Vec::new(), Some(SyncSkipReason::NoRepositories));
        }

        let results = GitSyncExecutor::new(Arc::clone(&c.vcs))
            .sync_all(&repositories, strategy)
            .await;
        self.warn_failed(&repositories, &results);
        (results, None)
    }

    fn warn_failed(&self, repositories: &[RepositoryHandle], results: &[RepositorySyncResult]) {
        for failed in results.iter().filter(|r| !r.succeeded) {
            let name = repositories
                .iter()
                .find(|repo| repo.id == failed.repository_id)
                .map(RepositoryHandle::display_name)
                .unwrap_or_else(|| failed.repository_id.clone());
            let error = failed.error_message.as_deref().unwrap_or_default();
            self.collaborators
                .notifier
                .notify_warning(SYNC_WARNING_TITLE, &sync_warning_message(&name, error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{HostVariant, StaticCapabilities};
    use crate::fakes::{
        FakeProcessSpawner, FakeProject, FakeTaskRunner, FakeVcs, RecordingNotifier,
        StaticSettings,
    };

    fn orchestrator(variant: HostVariant) -> BuildOrchestrator {
        let mut settings = Settings::default();
        settings.git_sync = GitSyncStrategy::None;
        settings.trigger_delay_ms = 0;
        settings.readiness.settle_delay_ms = 0;
        BuildOrchestrator::new(Collaborators {
            project: Arc::new(FakeProject::detached()),
            capabilities: Arc::new(StaticCapabilities::for_variant(variant)),
            vcs: Arc::new(FakeVcs::new()),
            tasks: Arc::new(FakeTaskRunner::succeeding()),
            spawner: Arc::new(FakeProcessSpawner::exiting(0)),
            notifier: Arc::new(RecordingNotifier::new()),
            settings: Arc::new(StaticSettings::new(settings)),
        })
    }

    #[test]
    fn test_sync_warning_message() {
        let msg = sync_warning_message("main", "CONFLICT");
        assert!(msg.starts_with("Git operations failed for main."));
        assert!(msg.ends_with("Error: CONFLICT"));
    }

    #[test]
    fn test_project_opened_routed_to_sync_listener() {
        let studio = orchestrator(HostVariant::AndroidStudio);
        assert!(!studio.accepts(Trigger::ProjectOpened));
        assert!(studio.accepts(Trigger::SyncSucceeded));

        let idea = orchestrator(HostVariant::IntelliJ);
        assert!(idea.accepts(Trigger::ProjectOpened));
    }

    #[tokio::test]
    async fn test_dropped_trigger_does_not_take_guard() {
        let studio = orchestrator(HostVariant::AndroidStudio);
        assert_eq!(studio.run(Trigger::ProjectOpened).await, RunOutcome::Dropped);
        assert!(!studio.is_running());
        assert_eq!(studio.current_step(), RunStep::NotStarted);
    }

    #[tokio::test]
    async fn test_run_resets_state() {
        let orch = orchestrator(HostVariant::IntelliJ);
        let outcome = orch.run(Trigger::Manual).await;
        assert!(outcome.report().is_some());
        assert!(!orch.is_running());
        assert_eq!(orch.current_step(), RunStep::NotStarted);
    }
}
