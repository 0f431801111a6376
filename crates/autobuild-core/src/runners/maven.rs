//! Maven backend: runs the configured goals as an external process in the
//! project root and maps the exit code.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::BuildRunner;
use crate::domain::{BuildPhase, BuildPhaseResult, BuildSystemKind};
use crate::ports::{ProcessCommand, ProcessSpawner, ProjectModel};

pub struct MavenRunner {
    project: Arc<dyn ProjectModel>,
    spawner: Arc<dyn ProcessSpawner>,
    program: String,
    goals: Vec<String>,
}

impl MavenRunner {
    pub fn new(
        project: Arc<dyn ProjectModel>,
        spawner: Arc<dyn ProcessSpawner>,
        program: String,
        goals: Vec<String>,
    ) -> Self {
        Self {
            project,
            spawner,
            program,
            goals,
        }
    }
}

#[async_trait]
impl BuildRunner for MavenRunner {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::Maven
    }

    async fn run(&self, phase: BuildPhase) -> BuildPhaseResult {
        let Some(base) = self.project.base_path() else {
            warn!(phase = %phase, "Project has no base path; cannot run Maven");
            return BuildPhaseResult::failure(phase, "project has no base path");
        };

        let command = ProcessCommand::new(&self.program, &base).args(self.goals.iter().cloned());
        info!(phase = %phase, command = %command.display(), "Running Maven build");

        match self.spawner.start(&command).await {
            Ok(output) if output.succeeded() => {
                info!(phase = %phase, "Maven build succeeded");
                BuildPhaseResult::success(phase)
            }
            Ok(output) => {
                warn!(phase = %phase, exit_code = output.exit_code, "Maven build failed");
                BuildPhaseResult::failure(phase, format!("exit code {}", output.exit_code))
            }
            Err(e) => {
                error!(phase = %phase, error = %e, "Maven build failed");
                BuildPhaseResult::failure(phase, e.to_string())
            }
        }
    }
}
