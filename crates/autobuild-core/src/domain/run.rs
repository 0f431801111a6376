//! Run triggers and run reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::build::{BuildPhaseResult, BuildSystemKind};
use crate::domain::sync::{GitSyncStrategy, RepositorySyncResult};

/// What asked for a pipeline run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// The project was opened in the host.
    ProjectOpened,
    /// The host finished syncing the project model.
    SyncSucceeded,
    /// The host decided no project sync was needed.
    SyncSkipped,
    /// Explicit user request.
    Manual,
}

impl Trigger {
    pub fn name(&self) -> &'static str {
        match self {
            Trigger::ProjectOpened => "project_opened",
            Trigger::SyncSucceeded => "sync_succeeded",
            Trigger::SyncSkipped => "sync_skipped",
            Trigger::Manual => "manual",
        }
    }

    /// Triggers that come from the host's project sync.
    pub fn is_sync_event(&self) -> bool {
        matches!(self, Trigger::SyncSucceeded | Trigger::SyncSkipped)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" | "project_opened" | "project-opened" => Ok(Trigger::ProjectOpened),
            "sync-succeeded" | "sync_succeeded" => Ok(Trigger::SyncSucceeded),
            "sync-skipped" | "sync_skipped" => Ok(Trigger::SyncSkipped),
            "manual" => Ok(Trigger::Manual),
            other => Err(format!("unknown trigger: {other}")),
        }
    }
}

/// Why the sync phase did no repository work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncSkipReason {
    StrategyNone,
    VcsInactive,
    NoRepositories,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub run_id: Uuid,

    pub trigger: Trigger,

    pub build_system: BuildSystemKind,

    pub strategy: GitSyncStrategy,

    pub first_build: BuildPhaseResult,

    pub sync_results: Vec<RepositorySyncResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_skipped: Option<SyncSkipReason>,

    pub second_build: BuildPhaseResult,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    pub duration_ms: u64,
}

impl RunReport {
    /// Repositories whose sync failed.
    pub fn failed_repositories(&self) -> impl Iterator<Item = &RepositorySyncResult> {
        self.sync_results.iter().filter(|r| !r.succeeded)
    }

    /// True when both builds and every repository sync succeeded.
    pub fn fully_succeeded(&self) -> bool {
        self.first_build.succeeded
            && self.second_build.succeeded
            && self.sync_results.iter().all(|r| r.succeeded)
    }
}

/// Result of asking the orchestrator to run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The pipeline ran to `Done`.
    Completed(Box<RunReport>),
    /// Another run was active, or the host routes this trigger elsewhere.
    Dropped,
}

impl RunOutcome {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::Dropped => None,
        }
    }
}
