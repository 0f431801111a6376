//! Build backends.
//!
//! Every backend implements [`BuildRunner`]: one awaitable call per build
//! phase that always resolves to a [`BuildPhaseResult`]. Backends hold no
//! per-run state, so the same runner serves both phases of a run.

mod gradle;
mod maven;
mod native;

pub use gradle::GradleRunner;
pub use maven::MavenRunner;
pub use native::{NativeRunner, BUILD_ALL_MODULES};

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{BuildPhase, BuildPhaseResult, BuildSystemKind};
use crate::ports::{ExternalTaskRunner, ProcessSpawner, ProjectModel};
use crate::settings::BuildSettings;

/// A build backend.
#[async_trait]
pub trait BuildRunner: Send + Sync {
    fn kind(&self) -> BuildSystemKind;

    /// Run one build. Never panics on build failure; failures are results.
    async fn run(&self, phase: BuildPhase) -> BuildPhaseResult;
}

/// Collaborators a backend may need.
#[derive(Clone)]
pub struct RunnerContext {
    pub project: Arc<dyn ProjectModel>,
    pub tasks: Arc<dyn ExternalTaskRunner>,
    pub spawner: Arc<dyn ProcessSpawner>,
}

/// Pick the backend for `kind`.
pub fn runner_for(
    kind: BuildSystemKind,
    ctx: &RunnerContext,
    settings: &BuildSettings,
) -> Box<dyn BuildRunner> {
    match kind {
        BuildSystemKind::Gradle => Box::new(GradleRunner::new(
            Arc::clone(&ctx.project),
            Arc::clone(&ctx.tasks),
            settings.gradle_tasks.clone(),
        )),
        BuildSystemKind::Maven => Box::new(MavenRunner::new(
            Arc::clone(&ctx.project),
            Arc::clone(&ctx.spawner),
            settings.maven_program.clone(),
            settings.maven_goals.clone(),
        )),
        BuildSystemKind::Jps => Box::new(NativeRunner::new(
            Arc::clone(&ctx.project),
            Arc::clone(&ctx.tasks),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeProject, FakeProcessSpawner, FakeTaskRunner};

    #[test]
    fn test_runner_for_matches_kind() {
        let ctx = RunnerContext {
            project: Arc::new(FakeProject::detached()),
            tasks: Arc::new(FakeTaskRunner::succeeding()),
            spawner: Arc::new(FakeProcessSpawner::exiting(0)),
        };
        let settings = BuildSettings::default();
        for kind in [
            BuildSystemKind::Gradle,
            BuildSystemKind::Maven,
            BuildSystemKind::Jps,
        ] {
            assert_eq!(runner_for(kind, &ctx, &settings).kind(), kind);
        }
    }
}
