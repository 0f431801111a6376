//! Autobuild Core
//!
//! Post-sync build orchestration: detect the project's build system, build
//! it, fetch and merge/rebase its git remotes, build again, then signal
//! completion. Host integration happens through the traits in [`ports`];
//! [`fakes`] provides in-memory implementations for tests.

pub mod capabilities;
pub mod detector;
pub mod domain;
pub mod fakes;
pub mod git_sync;
pub mod obs;
pub mod orchestrator;
pub mod ports;
pub mod readiness;
pub mod runners;
pub mod settings;
pub mod telemetry;

pub use capabilities::{HostCapabilities, HostFeature, HostVariant, StaticCapabilities};
pub use detector::BuildSystemDetector;
pub use domain::{
    AutobuildError, BuildPhase, BuildPhaseResult, BuildSystemKind, GitSyncStrategy,
    RepositorySyncResult, Result, RunOutcome, RunReport, RunState, RunStep, SyncSkipReason,
    Trigger,
};
pub use git_sync::{resolve_upstream, GitSyncExecutor};
pub use orchestrator::{BuildOrchestrator, Collaborators, SYNC_WARNING_TITLE};
pub use ports::{
    BatchResult, CommandResult, ExternalSystem, ExternalTaskRunner, NotificationSink,
    ProcessCommand, ProcessOutput, ProcessSpawner, ProjectModel, RebaseParams, RepositoryHandle,
    SettingsStore, TaskConfig, TaskOutcome, VcsIntegration,
};
pub use readiness::{is_ready, wait_until_ready};
pub use runners::{BuildRunner, GradleRunner, MavenRunner, NativeRunner, RunnerContext};
pub use settings::{BuildSettings, CompletionSound, ReadinessConfig, Settings, SETTINGS_VERSION};
pub use telemetry::init_tracing;

/// Autobuild version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
