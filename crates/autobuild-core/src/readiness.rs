//! Waiting for the host project to become buildable.
//!
//! The only polling loop in the pipeline. It re-checks project state every
//! poll interval and gives up after the configured timeout.

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::capabilities::{HostCapabilities, HostFeature};
use crate::domain::error::{AutobuildError, Result};
use crate::ports::ProjectModel;
use crate::settings::ReadinessConfig;

/// Whether the project can be built right now.
pub fn is_ready(project: &dyn ProjectModel, capabilities: &dyn HostCapabilities) -> bool {
    let initialized = project.is_initialized();
    let indexing = project.is_indexing();
    let external_sync = capabilities.supports_feature(HostFeature::ExternalSyncState)
        && project.is_external_sync_in_progress();

    debug!(
        initialized = initialized,
        indexing = indexing,
        external_sync = external_sync,
        "Readiness check"
    );

    initialized && !indexing && !external_sync
}

/// Block the pipeline until the project is ready, bounded by `config.timeout`.
///
/// Returns `ReadinessTimeout` when the bound is exceeded.
pub async fn wait_until_ready(
    project: &dyn ProjectModel,
    capabilities: &dyn HostCapabilities,
    config: &ReadinessConfig,
) -> Result<()> {
    info!(
        project = %project.name(),
        timeout_secs = config.timeout_secs,
        "Waiting for project readiness"
    );

    let poll = async {
        while !is_ready(project, capabilities) {
            sleep(config.poll_interval()).await;
        }
    };

    match timeout(config.timeout(), poll).await {
        Ok(()) => {
            sleep(config.settle_delay()).await;
            info!(project = %project.name(), "Project ready");
            Ok(())
        }
        Err(_) => {
            warn!(
                project = %project.name(),
                timeout_secs = config.timeout_secs,
                "Timed out waiting for project readiness"
            );
            Err(AutobuildError::ReadinessTimeout(config.timeout()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{HostVariant, StaticCapabilities};
    use crate::fakes::FakeProject;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_ready_project_returns_immediately() {
        let project = FakeProject::detached();
        let caps = StaticCapabilities::for_variant(HostVariant::IntelliJ);
        let start = tokio::time::Instant::now();

        wait_until_ready(&project, &caps, &ReadinessConfig::default())
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_indexing_to_finish() {
        let project = FakeProject::detached().indexing(true);
        let caps = StaticCapabilities::for_variant(HostVariant::IntelliJ);

        let flag = project.indexing_flag();
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            flag.store(false, std::sync::atomic::Ordering::SeqCst);
        });

        let start = tokio::time::Instant::now();
        wait_until_ready(&project, &caps, &ReadinessConfig::default())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_bound() {
        let project = FakeProject::detached().initialized(false);
        let caps = StaticCapabilities::for_variant(HostVariant::IntelliJ);

        let err = wait_until_ready(&project, &caps, &ReadinessConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AutobuildError::ReadinessTimeout(d) if d == Duration::from_secs(120)
        ));
    }

    #[test]
    fn test_external_sync_only_counts_when_supported() {
        let project = FakeProject::detached().external_sync(true);

        let studio = StaticCapabilities::for_variant(HostVariant::AndroidStudio);
        assert!(!is_ready(&project, &studio));

        let idea = StaticCapabilities::for_variant(HostVariant::IntelliJ);
        assert!(is_ready(&project, &idea));
    }
}
