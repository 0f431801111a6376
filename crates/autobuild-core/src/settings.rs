//! User settings: one versioned struct with explicit defaults.
//!
//! Settings are read once at the start of a run and never change while it
//! is active. Every field falls back to its default when absent, so a file
//! containing only `git_sync = "rebase"` is valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::error::{AutobuildError, Result};
use crate::domain::GitSyncStrategy;

/// Current settings schema version.
pub const SETTINGS_VERSION: u32 = 1;

/// Sound played when a run completes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompletionSound {
    None,
    #[default]
    Music1,
    Music2,
    Music3,
    Music4,
    Music5,
    Music6,
}

impl CompletionSound {
    /// Resource stem of the sound file (`<name>.wav`).
    pub fn name(&self) -> &'static str {
        match self {
            CompletionSound::None => "none",
            CompletionSound::Music1 => "music1",
            CompletionSound::Music2 => "music2",
            CompletionSound::Music3 => "music3",
            CompletionSound::Music4 => "music4",
            CompletionSound::Music5 => "music5",
            CompletionSound::Music6 => "music6",
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, CompletionSound::None)
    }
}

impl fmt::Display for CompletionSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompletionSound {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CompletionSound::None),
            "music1" => Ok(CompletionSound::Music1),
            "music2" => Ok(CompletionSound::Music2),
            "music3" => Ok(CompletionSound::Music3),
            "music4" => Ok(CompletionSound::Music4),
            "music5" => Ok(CompletionSound::Music5),
            "music6" => Ok(CompletionSound::Music6),
            other => Err(format!("unknown completion sound: {other}")),
        }
    }
}

/// Bounds for waiting on host readiness before a build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Whether builds wait for readiness at all.
    pub enabled: bool,

    /// Give up after this many seconds.
    pub timeout_secs: u64,

    /// Delay between readiness re-checks.
    pub poll_interval_ms: u64,

    /// Extra delay once ready, to let the project model settle.
    pub settle_delay_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 120,
            poll_interval_ms: 1_000,
            settle_delay_ms: 300,
        }
    }
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Build backend parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildSettings {
    /// Gradle task names.
    pub gradle_tasks: Vec<String>,

    /// Maven executable.
    pub maven_program: String,

    /// Maven goals.
    pub maven_goals: Vec<String>,

    /// Command for the host-native build; first element is the executable.
    pub native_command: Option<Vec<String>>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            gradle_tasks: vec!["build".to_string()],
            maven_program: "mvn".to_string(),
            maven_goals: vec!["clean".to_string(), "package".to_string()],
            native_command: None,
        }
    }
}

/// Persisted user configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub version: u32,

    pub git_sync: GitSyncStrategy,

    pub sound: CompletionSound,

    /// Delay before starting a run requested by a host sync event.
    pub trigger_delay_ms: u64,

    pub readiness: ReadinessConfig,

    pub build: BuildSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            git_sync: GitSyncStrategy::default(),
            sound: CompletionSound::default(),
            trigger_delay_ms: 2_000,
            readiness: ReadinessConfig::default(),
            build: BuildSettings::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AutobuildError::Settings(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != SETTINGS_VERSION {
            return Err(AutobuildError::SettingsVersion {
                found: self.version,
                expected: SETTINGS_VERSION,
            });
        }
        if self.build.gradle_tasks.is_empty() {
            return Err(AutobuildError::Settings(
                "build.gradle_tasks must not be empty".to_string(),
            ));
        }
        if let Some(cmd) = &self.build.native_command {
            if cmd.is_empty() {
                return Err(AutobuildError::Settings(
                    "build.native_command must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn trigger_delay(&self) -> Duration {
        Duration::from_millis(self.trigger_delay_ms)
    }
}
