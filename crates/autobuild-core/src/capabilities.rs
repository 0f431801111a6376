//! Host capability queries.
//!
//! Optional host integrations are answered from static feature flags per
//! host variant rather than probed at runtime.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Optional host integration the core can take advantage of.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HostFeature {
    /// Linked Gradle projects can be queried and Gradle tasks run.
    GradleIntegration,
    /// Maven projects are recognised.
    MavenIntegration,
    /// Git is available as a version-control backend.
    GitIntegration,
    /// The host reports whether its own Gradle sync is in progress.
    ExternalSyncState,
    /// The host emits sync-finished events that start runs.
    SyncListener,
}

impl HostFeature {
    pub fn name(&self) -> &'static str {
        match self {
            HostFeature::GradleIntegration => "gradle",
            HostFeature::MavenIntegration => "maven",
            HostFeature::GitIntegration => "git",
            HostFeature::ExternalSyncState => "external-sync-state",
            HostFeature::SyncListener => "sync-listener",
        }
    }
}

/// Answers whether the host supports a feature.
pub trait HostCapabilities: Send + Sync {
    fn supports_feature(&self, feature: HostFeature) -> bool;
}

/// Known host flavours.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HostVariant {
    IntelliJ,
    AndroidStudio,
    /// Standalone command-line host.
    #[default]
    Headless,
}

impl HostVariant {
    pub fn features(&self) -> &'static [HostFeature] {
        use HostFeature::*;
        match self {
            HostVariant::IntelliJ => &[GradleIntegration, MavenIntegration, GitIntegration],
            HostVariant::AndroidStudio => &[
                GradleIntegration,
                GitIntegration,
                ExternalSyncState,
                SyncListener,
            ],
            HostVariant::Headless => &[GradleIntegration, MavenIntegration, GitIntegration],
        }
    }
}

impl fmt::Display for HostVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostVariant::IntelliJ => f.write_str("intellij"),
            HostVariant::AndroidStudio => f.write_str("android-studio"),
            HostVariant::Headless => f.write_str("headless"),
        }
    }
}

impl FromStr for HostVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intellij" | "idea" => Ok(HostVariant::IntelliJ),
            "android-studio" | "android_studio" | "studio" => Ok(HostVariant::AndroidStudio),
            "headless" => Ok(HostVariant::Headless),
            other => Err(format!("unknown host variant: {other}")),
        }
    }
}

/// Fixed feature set.
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities {
    features: HashSet<HostFeature>,
}

impl StaticCapabilities {
    pub fn for_variant(variant: HostVariant) -> Self {
        Self {
            features: variant.features().iter().copied().collect(),
        }
    }

    pub fn from_features(features: impl IntoIterator<Item = HostFeature>) -> Self {
        Self {
            features: features.into_iter().collect(),
        }
    }

    pub fn with(mut self, feature: HostFeature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn without(mut self, feature: HostFeature) -> Self {
        self.features.remove(&feature);
        self
    }
}

impl HostCapabilities for StaticCapabilities {
    fn supports_feature(&self, feature: HostFeature) -> bool {
        self.features.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_studio_has_sync_listener() {
        let caps = StaticCapabilities::for_variant(HostVariant::AndroidStudio);
        assert!(caps.supports_feature(HostFeature::SyncListener));
        assert!(caps.supports_feature(HostFeature::ExternalSyncState));
        assert!(!caps.supports_feature(HostFeature::MavenIntegration));
    }

    #[test]
    fn test_intellij_has_no_sync_listener() {
        let caps = StaticCapabilities::for_variant(HostVariant::IntelliJ);
        assert!(!caps.supports_feature(HostFeature::SyncListener));
        assert!(caps.supports_feature(HostFeature::MavenIntegration));
    }

    #[test]
    fn test_with_and_without() {
        let caps = StaticCapabilities::default()
            .with(HostFeature::GitIntegration)
            .with(HostFeature::MavenIntegration)
            .without(HostFeature::MavenIntegration);
        assert!(caps.supports_feature(HostFeature::GitIntegration));
        assert!(!caps.supports_feature(HostFeature::MavenIntegration));
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!("studio".parse::<HostVariant>(), Ok(HostVariant::AndroidStudio));
        assert_eq!(HostVariant::AndroidStudio.to_string(), "android-studio");
    }
}
