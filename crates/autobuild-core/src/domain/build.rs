//! Build system kinds and build phase results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Build system backing a project.
///
/// Determined once per run and never changed while the run is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuildSystemKind {
    Gradle,
    Maven,
    /// The host's native build ("build all modules").
    Jps,
}

impl BuildSystemKind {
    pub fn name(&self) -> &'static str {
        match self {
            BuildSystemKind::Gradle => "Gradle",
            BuildSystemKind::Maven => "Maven",
            BuildSystemKind::Jps => "JPS",
        }
    }
}

impl fmt::Display for BuildSystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which of the two build invocations a result belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    First,
    Second,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildPhase::First => f.write_str("first"),
            BuildPhase::Second => f.write_str("second"),
        }
    }
}

/// Outcome of one build invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildPhaseResult {
    pub phase: BuildPhase,

    pub succeeded: bool,

    /// Set when the build was never invoked (precondition not met).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,

    /// Diagnostic for failed builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl BuildPhaseResult {
    pub fn success(phase: BuildPhase) -> Self {
        Self {
            phase,
            succeeded: true,
            skipped: None,
            detail: None,
        }
    }

    pub fn failure(phase: BuildPhase, detail: impl Into<String>) -> Self {
        Self {
            phase,
            succeeded: false,
            skipped: None,
            detail: Some(detail.into()),
        }
    }

    /// A phase whose build was omitted. Counts as not succeeded.
    pub fn skipped(phase: BuildPhase, reason: impl Into<String>) -> Self {
        Self {
            phase,
            succeeded: false,
            skipped: Some(reason.into()),
            detail: None,
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_names() {
        assert_eq!(BuildSystemKind::Gradle.to_string(), "Gradle");
        assert_eq!(BuildSystemKind::Maven.to_string(), "Maven");
        assert_eq!(BuildSystemKind::Jps.to_string(), "JPS");
    }

    #[test]
    fn test_build_system_serde() {
        let json = serde_json::to_string(&BuildSystemKind::Jps).unwrap();
        assert_eq!(json, "\"jps\"");
    }

    #[test]
    fn test_skipped_phase_is_not_success() {
        let result = BuildPhaseResult::skipped(BuildPhase::First, "project not ready");
        assert!(!result.succeeded);
        assert!(result.was_skipped());
    }

    #[test]
    fn test_failure_keeps_detail() {
        let result = BuildPhaseResult::failure(BuildPhase::Second, "exit code 1");
        assert!(!result.succeeded);
        assert!(!result.was_skipped());
        assert_eq!(result.detail.as_deref(), Some("exit code 1"));
    }
}
