//! Structured observability hooks for the run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via `run_span`
//! - Emission functions for lifecycle events: start, step, phase, repository, finish
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).

use tracing::{info, warn};

use crate::domain::{BuildPhaseResult, RunStep, Trigger};

/// Span tagging every record of one run with its id and project.
///
/// Attach with `Instrument::instrument` so it follows the run across awaits.
pub fn run_span(run_id: &str, project: &str) -> tracing::Span {
    tracing::info_span!("autobuild.run", run_id = %run_id, project = %project)
}

/// Emit event: run accepted and started.
pub fn emit_run_started(run_id: &str, trigger: Trigger, build_system: &str) {
    info!(
        event = "run.started",
        run_id = %run_id,
        trigger = %trigger,
        build_system = %build_system,
    );
}

/// Emit event: the orchestrator entered a step.
pub fn emit_step_entered(run_id: &str, step: RunStep) {
    info!(event = "run.step", run_id = %run_id, step = %step);
}

/// Emit event: a build phase finished (or was skipped).
pub fn emit_phase_finished(run_id: &str, result: &BuildPhaseResult) {
    info!(
        event = "build.finished",
        run_id = %run_id,
        phase = %result.phase,
        succeeded = result.succeeded,
        skipped = result.was_skipped(),
    );
}

/// Emit event: one repository finished syncing.
pub fn emit_repository_synced(repository_id: &str, succeeded: bool) {
    info!(event = "git.synced", repo = %repository_id, succeeded = succeeded);
}

/// Emit event: run reached `Done`.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, failed_repositories: usize, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        failed_repositories = failed_repositories,
        success = success,
    );
}

/// Emit event: a trigger was dropped (run already active, or routed elsewhere).
pub fn emit_trigger_dropped(trigger: Trigger, reason: &str) {
    warn!(event = "run.trigger_dropped", trigger = %trigger, reason = %reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_enter() {
        let span = run_span("test-run-id", "demo");
        let _entered = span.enter();
    }
}
