//! Git sync policy and per-repository outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How upstream changes are integrated after fetching.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GitSyncStrategy {
    /// Opt out of git sync entirely.
    None,
    #[default]
    Merge,
    Rebase,
}

impl GitSyncStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            GitSyncStrategy::None => "none",
            GitSyncStrategy::Merge => "merge",
            GitSyncStrategy::Rebase => "rebase",
        }
    }
}

impl fmt::Display for GitSyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GitSyncStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(GitSyncStrategy::None),
            "merge" => Ok(GitSyncStrategy::Merge),
            "rebase" => Ok(GitSyncStrategy::Rebase),
            other => Err(format!("unknown git sync strategy: {other}")),
        }
    }
}

/// Outcome of fetch + merge/rebase for one repository.
///
/// Lives for one run only; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositorySyncResult {
    pub repository_id: String,

    pub succeeded: bool,

    /// Raw diagnostic text from the failing tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RepositorySyncResult {
    pub fn ok(repository_id: impl Into<String>) -> Self {
        Self {
            repository_id: repository_id.into(),
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failed(repository_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            repository_id: repository_id.into(),
            succeeded: false,
            error_message: Some(error_message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_default_is_merge() {
        assert_eq!(GitSyncStrategy::default(), GitSyncStrategy::Merge);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Rebase".parse::<GitSyncStrategy>(), Ok(GitSyncStrategy::Rebase));
        assert_eq!("none".parse::<GitSyncStrategy>(), Ok(GitSyncStrategy::None));
        assert!("squash".parse::<GitSyncStrategy>().is_err());
    }

    #[test]
    fn test_failed_result_keeps_message_verbatim() {
        let result = RepositorySyncResult::failed("app", "CONFLICT (content): x.txt\n");
        assert!(!result.succeeded);
        assert_eq!(
            result.error_message.as_deref(),
            Some("CONFLICT (content): x.txt\n")
        );
    }
}
