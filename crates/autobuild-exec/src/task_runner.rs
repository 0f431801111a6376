//! External tasks run as processes: Gradle through its wrapper or the
//! `gradle` launcher, native builds through a configured command.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use autobuild_core::{
    ExternalSystem, ExternalTaskRunner, ProcessCommand, ProcessSpawner, TaskConfig, TaskOutcome,
};

#[cfg(windows)]
const GRADLE_WRAPPER: &str = "gradlew.bat";
#[cfg(not(windows))]
const GRADLE_WRAPPER: &str = "gradlew";

/// Launcher used when the project has no wrapper.
pub const GRADLE_LAUNCHER: &str = "gradle";

pub struct CommandTaskRunner {
    spawner: Arc<dyn ProcessSpawner>,
    native_command: Option<Vec<String>>,
}

impl CommandTaskRunner {
    pub fn new(spawner: Arc<dyn ProcessSpawner>, native_command: Option<Vec<String>>) -> Self {
        Self {
            spawner,
            native_command,
        }
    }

    fn gradle_command(project_path: &Path, task_names: &[String]) -> ProcessCommand {
        let wrapper = project_path.join(GRADLE_WRAPPER);
        let program = if wrapper.is_file() {
            wrapper.display().to_string()
        } else {
            GRADLE_LAUNCHER.to_string()
        };
        ProcessCommand::new(program, project_path).args(task_names.iter().cloned())
    }

    fn native_command(&self, project_path: &Path) -> Option<ProcessCommand> {
        let (program, args) = self.native_command.as_ref()?.split_first()?;
        Some(ProcessCommand::new(program.clone(), project_path).args(args.iter().cloned()))
    }
}

#[async_trait]
impl ExternalTaskRunner for CommandTaskRunner {
    async fn run_task(&self, config: &TaskConfig) -> TaskOutcome {
        let command = match config.system {
            ExternalSystem::Gradle => Self::gradle_command(&config.project_path, &config.task_names),
            ExternalSystem::Native => {
                debug!(tasks = ?config.task_names, "Native build requested");
                match self.native_command(&config.project_path) {
                    Some(command) => command,
                    None => {
                        warn!("No native build command configured");
                        return TaskOutcome::Failed("no native build command configured".to_string());
                    }
                }
            }
        };

        match self.spawner.start(&command).await {
            Ok(output) if output.succeeded() => TaskOutcome::Succeeded,
            Ok(output) => TaskOutcome::Failed(format!(
                "{} exited with code {}",
                command.display(),
                output.exit_code
            )),
            Err(e) => TaskOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobuild_core::fakes::FakeProcessSpawner;
    use std::path::PathBuf;

    fn gradle_task(path: &Path) -> TaskConfig {
        TaskConfig {
            system: ExternalSystem::Gradle,
            project_path: path.to_path_buf(),
            task_names: vec!["build".to_string()],
        }
    }

    #[tokio::test]
    async fn test_gradle_prefers_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(GRADLE_WRAPPER), "#!/bin/sh\n").unwrap();
        let spawner = Arc::new(FakeProcessSpawner::exiting(0));
        let runner = CommandTaskRunner::new(spawner.clone(), None);

        assert!(runner.run_task(&gradle_task(dir.path())).await.is_success());
        let calls = spawner.calls();
        assert_eq!(calls[0].program, dir.path().join(GRADLE_WRAPPER).display().to_string());
        assert_eq!(calls[0].args, vec!["build"]);
        assert_eq!(calls[0].working_dir, dir.path().to_path_buf());
    }

    #[tokio::test]
    async fn test_gradle_without_wrapper_uses_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let spawner = Arc::new(FakeProcessSpawner::exiting(1));
        let runner = CommandTaskRunner::new(spawner.clone(), None);

        let outcome = runner.run_task(&gradle_task(dir.path())).await;
        assert_eq!(
            outcome,
            TaskOutcome::Failed("gradle build exited with code 1".to_string())
        );
        assert_eq!(spawner.calls()[0].program, GRADLE_LAUNCHER);
    }

    #[tokio::test]
    async fn test_native_without_command_fails() {
        let spawner = Arc::new(FakeProcessSpawner::exiting(0));
        let runner = CommandTaskRunner::new(spawner.clone(), None);
        let config = TaskConfig {
            system: ExternalSystem::Native,
            project_path: PathBuf::from("/work"),
            task_names: vec!["buildAllModules".to_string()],
        };

        assert!(!runner.run_task(&config).await.is_success());
        assert!(spawner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_native_runs_configured_command() {
        let spawner = Arc::new(FakeProcessSpawner::exiting(0));
        let runner = CommandTaskRunner::new(
            spawner.clone(),
            Some(vec!["make".to_string(), "-j4".to_string()]),
        );
        let config = TaskConfig {
            system: ExternalSystem::Native,
            project_path: PathBuf::from("/work"),
            task_names: vec!["buildAllModules".to_string()],
        };

        assert!(runner.run_task(&config).await.is_success());
        let calls = spawner.calls();
        assert_eq!(calls[0].display(), "make -j4");
        assert_eq!(calls[0].working_dir, PathBuf::from("/work"));
    }

    #[tokio::test]
    async fn test_unspawnable_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CommandTaskRunner::new(Arc::new(FakeProcessSpawner::unspawnable()), None);
        let outcome = runner.run_task(&gradle_task(dir.path())).await;
        assert!(matches!(outcome, TaskOutcome::Failed(msg) if msg.contains("gradle")));
    }
}
