//! Build system detection.
//!
//! Gradle is checked first, then Maven; JPS (the host's native build) is the
//! fallback since every project can be built that way.

use tracing::debug;

use crate::capabilities::{HostCapabilities, HostFeature};
use crate::domain::BuildSystemKind;
use crate::ports::ProjectModel;

/// Maven descriptor expected at the project root.
pub const MAVEN_DESCRIPTOR: &str = "pom.xml";

/// Decides which build system a project uses. Pure read, no side effects.
pub struct BuildSystemDetector<'a> {
    capabilities: &'a dyn HostCapabilities,
}

impl<'a> BuildSystemDetector<'a> {
    pub fn new(capabilities: &'a dyn HostCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn detect(&self, project: &dyn ProjectModel) -> BuildSystemKind {
        let kind = if self.is_gradle(project) {
            BuildSystemKind::Gradle
        } else if self.is_maven(project) {
            BuildSystemKind::Maven
        } else {
            BuildSystemKind::Jps
        };
        debug!(project = %project.name(), build_system = %kind, "Detected build system");
        kind
    }

    fn is_gradle(&self, project: &dyn ProjectModel) -> bool {
        self.capabilities
            .supports_feature(HostFeature::GradleIntegration)
            && !project.linked_gradle_projects().is_empty()
    }

    fn is_maven(&self, project: &dyn ProjectModel) -> bool {
        if !self
            .capabilities
            .supports_feature(HostFeature::MavenIntegration)
        {
            return false;
        }
        project
            .base_path()
            .map(|base| base.join(MAVEN_DESCRIPTOR).is_file())
            .unwrap_or(false)
    }
}
