//! Per-project run state: current step plus the run-in-progress guard.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::{AutobuildError, Result};

/// Steps of the pipeline, in the only order they may be visited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunStep {
    NotStarted,
    Building1,
    Syncing,
    Building2,
    Done,
}

impl RunStep {
    /// The step that must follow this one, if any.
    pub fn next(&self) -> Option<RunStep> {
        match self {
            RunStep::NotStarted => Some(RunStep::Building1),
            RunStep::Building1 => Some(RunStep::Syncing),
            RunStep::Syncing => Some(RunStep::Building2),
            RunStep::Building2 => Some(RunStep::Done),
            RunStep::Done => None,
        }
    }

    /// Whether a new run may start from this step.
    pub fn is_idle(&self) -> bool {
        matches!(self, RunStep::NotStarted | RunStep::Done)
    }
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Mutable state of the orchestrator for one project.
///
/// `guard` is held from the moment a run is accepted until it reaches `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    current_step: RunStep,
    guard: bool,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            current_step: RunStep::NotStarted,
            guard: false,
        }
    }

    pub fn current_step(&self) -> RunStep {
        self.current_step
    }

    pub fn is_running(&self) -> bool {
        self.guard
    }

    /// Check-and-set the guard. Returns `false` when a run is already active.
    ///
    /// A state left at `Done` is reset to `NotStarted` before the new run.
    pub fn try_acquire(&mut self) -> bool {
        if self.guard || !self.current_step.is_idle() {
            return false;
        }
        self.current_step = RunStep::NotStarted;
        self.guard = true;
        true
    }

    /// Move to `to`, which must be the immediate successor of the current step.
    pub fn advance(&mut self, to: RunStep) -> Result<()> {
        if !self.guard || self.current_step.next() != Some(to) {
            return Err(AutobuildError::InvalidTransition {
                from: self.current_step.to_string(),
                to: to.to_string(),
            });
        }
        self.current_step = to;
        Ok(())
    }

    /// Drop the guard and return to `NotStarted`.
    pub fn release(&mut self) {
        self.current_step = RunStep::NotStarted;
        self.guard = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_to(state: &mut RunState, target: RunStep) {
        while state.current_step() != target {
            let next = state.current_step().next().unwrap();
            state.advance(next).unwrap();
        }
    }

    #[test]
    fn test_full_sequence() {
        let mut state = RunState::new();
        assert!(state.try_acquire());
        walk_to(&mut state, RunStep::Done);
        assert_eq!(state.current_step(), RunStep::Done);
        assert!(state.is_running());
    }

    #[test]
    fn test_cannot_skip_syncing() {
        let mut state = RunState::new();
        assert!(state.try_acquire());
        state.advance(RunStep::Building1).unwrap();
        let err = state.advance(RunStep::Building2).unwrap_err();
        assert!(matches!(err, AutobuildError::InvalidTransition { .. }));
        assert_eq!(state.current_step(), RunStep::Building1);
    }

    #[test]
    fn test_cannot_go_backwards() {
        let mut state = RunState::new();
        assert!(state.try_acquire());
        walk_to(&mut state, RunStep::Syncing);
        assert!(state.advance(RunStep::Building1).is_err());
    }

    #[test]
    fn test_advance_requires_guard() {
        let mut state = RunState::new();
        assert!(state.advance(RunStep::Building1).is_err());
    }

    #[test]
    fn test_second_acquire_is_rejected_while_running() {
        let mut state = RunState::new();
        assert!(state.try_acquire());
        state.advance(RunStep::Building1).unwrap();
        assert!(!state.try_acquire());
    }

    #[test]
    fn test_release_resets_for_next_run() {
        let mut state = RunState::new();
        assert!(state.try_acquire());
        walk_to(&mut state, RunStep::Done);
        state.release();
        assert_eq!(state.current_step(), RunStep::NotStarted);
        assert!(!state.is_running());
        assert!(state.try_acquire());
    }

    #[test]
    fn test_step_ordering() {
        assert!(RunStep::NotStarted < RunStep::Building1);
        assert!(RunStep::Building2 < RunStep::Done);
        assert!(RunStep::Done.is_idle());
        assert!(!RunStep::Syncing.is_idle());
    }
}
