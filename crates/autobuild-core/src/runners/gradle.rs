//! Gradle backend: dispatches tasks for the first linked Gradle project.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::BuildRunner;
use crate::domain::{BuildPhase, BuildPhaseResult, BuildSystemKind};
use crate::ports::{ExternalSystem, ExternalTaskRunner, ProjectModel, TaskConfig, TaskOutcome};

pub struct GradleRunner {
    project: Arc<dyn ProjectModel>,
    tasks: Arc<dyn ExternalTaskRunner>,
    task_names: Vec<String>,
}

impl GradleRunner {
    pub fn new(
        project: Arc<dyn ProjectModel>,
        tasks: Arc<dyn ExternalTaskRunner>,
        task_names: Vec<String>,
    ) -> Self {
        Self {
            project,
            tasks,
            task_names,
        }
    }
}

#[async_trait]
impl BuildRunner for GradleRunner {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::Gradle
    }

    async fn run(&self, phase: BuildPhase) -> BuildPhaseResult {
        let Some(project_path) = self.project.linked_gradle_projects().into_iter().next() else {
            warn!(phase = %phase, "No linked Gradle project found");
            return BuildPhaseResult::failure(phase, "no linked Gradle project");
        };

        info!(
            phase = %phase,
            path = %project_path.display(),
            tasks = ?self.task_names,
            "Running Gradle build"
        );
        let config = TaskConfig {
            system: ExternalSystem::Gradle,
            project_path,
            task_names: self.task_names.clone(),
        };

        match self.tasks.run_task(&config).await {
            TaskOutcome::Succeeded => {
                info!(phase = %phase, "Gradle build succeeded");
                BuildPhaseResult::success(phase)
            }
            TaskOutcome::Failed(detail) => {
                warn!(phase = %phase, error = %detail, "Gradle build failed");
                BuildPhaseResult::failure(phase, detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeProject, FakeTaskRunner};
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_no_linked_project_fails_without_dispatch() {
        let tasks = Arc::new(FakeTaskRunner::succeeding());
        let runner = GradleRunner::new(
            Arc::new(FakeProject::detached()),
            tasks.clone(),
            vec!["build".to_string()],
        );

        let result = runner.run(BuildPhase::First).await;
        assert!(!result.succeeded);
        assert!(!result.was_skipped());
        assert!(tasks.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatches_build_task_for_first_linked_project() {
        let tasks = Arc::new(FakeTaskRunner::succeeding());
        let project = FakeProject::detached()
            .with_gradle_project("/work/app")
            .with_gradle_project("/work/lib");
        let runner = GradleRunner::new(Arc::new(project), tasks.clone(), vec!["build".to_string()]);

        let result = runner.run(BuildPhase::Second).await;
        assert!(result.succeeded);
        assert_eq!(result.phase, BuildPhase::Second);

        let calls = tasks.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, ExternalSystem::Gradle);
        assert_eq!(calls[0].project_path, PathBuf::from("/work/app"));
        assert_eq!(calls[0].task_names, vec!["build"]);
    }

    #[tokio::test]
    async fn test_task_failure_maps_to_failed_phase() {
        let tasks = Arc::new(FakeTaskRunner::failing("compilation failed"));
        let project = FakeProject::detached().with_gradle_project("/work/app");
        let runner = GradleRunner::new(Arc::new(project), tasks, vec!["build".to_string()]);

        let result = runner.run(BuildPhase::First).await;
        assert!(!result.succeeded);
        assert_eq!(result.detail.as_deref(), Some("compilation failed"));
    }
}
