//! Host-native build ("build all modules"), used for JPS projects.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::BuildRunner;
use crate::domain::{BuildPhase, BuildPhaseResult, BuildSystemKind};
use crate::ports::{ExternalSystem, ExternalTaskRunner, ProjectModel, TaskConfig, TaskOutcome};

/// Task name of the native build.
pub const BUILD_ALL_MODULES: &str = "buildAllModules";

pub struct NativeRunner {
    project: Arc<dyn ProjectModel>,
    tasks: Arc<dyn ExternalTaskRunner>,
}

impl NativeRunner {
    pub fn new(project: Arc<dyn ProjectModel>, tasks: Arc<dyn ExternalTaskRunner>) -> Self {
        Self { project, tasks }
    }
}

#[async_trait]
impl BuildRunner for NativeRunner {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::Jps
    }

    async fn run(&self, phase: BuildPhase) -> BuildPhaseResult {
        let config = TaskConfig {
            system: ExternalSystem::Native,
            project_path: self.project.base_path().unwrap_or_else(|| PathBuf::from(".")),
            task_names: vec![BUILD_ALL_MODULES.to_string()],
        };
        info!(phase = %phase, "Running native (JPS) build");

        match self.tasks.run_task(&config).await {
            TaskOutcome::Succeeded => BuildPhaseResult::success(phase),
            TaskOutcome::Failed(detail) => {
                warn!(phase = %phase, error = %detail, "Native build failed");
                BuildPhaseResult::failure(phase, detail)
            }
        }
    }
}
