//! Domain models for autobuild.
//!
//! - `BuildSystemKind`, `BuildPhaseResult`: what gets built and how it went
//! - `GitSyncStrategy`, `RepositorySyncResult`: how remotes are integrated
//! - `RunState`, `RunStep`: the orchestrator's guarded step machine
//! - `Trigger`, `RunReport`: why a run started and what it produced

pub mod build;
pub mod error;
pub mod run;
pub mod state;
pub mod sync;

pub use build::{BuildPhase, BuildPhaseResult, BuildSystemKind};
pub use error::{AutobuildError, Result};
pub use run::{RunOutcome, RunReport, SyncSkipReason, Trigger};
pub use state::{RunState, RunStep};
pub use sync::{GitSyncStrategy, RepositorySyncResult};
