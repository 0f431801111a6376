//! Error taxonomy for the build orchestration core.

use std::time::Duration;

/// Autobuild errors.
///
/// None of these abort a pipeline run: the orchestrator turns every error
/// into a failed phase result and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum AutobuildError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git error: {0}")]
    Git(String),

    #[error("project not ready after {0:?}")]
    ReadinessTimeout(Duration),

    #[error("invalid run step transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("task configuration error: {0}")]
    TaskConfig(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("unsupported settings version {found} (expected {expected})")]
    SettingsVersion { found: u32, expected: u32 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for autobuild operations.
pub type Result<T> = std::result::Result<T, AutobuildError>;
