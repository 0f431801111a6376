//! Fetch all remotes, then merge or rebase each repository onto its upstream.
//!
//! Repositories are independent: one failing does not stop the others, and
//! nothing already merged or rebased is rolled back.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{GitSyncStrategy, RepositorySyncResult};
use crate::obs::emit_repository_synced;
use crate::ports::{RebaseParams, RepositoryHandle, VcsIntegration};

/// Message used when the batch fetch fails without a diagnostic.
pub const FETCH_FAILED: &str = "Fetch command failed";

/// Remote used when a branch has no tracked upstream.
pub const DEFAULT_REMOTE: &str = "origin";

/// Upstream to integrate for `repository`, or `None` when nothing is checked out.
pub fn resolve_upstream(repository: &RepositoryHandle) -> Option<String> {
    let branch = repository.current_branch.as_deref()?;
    Some(
        repository
            .tracked_branch
            .clone()
            .unwrap_or_else(|| format!("{DEFAULT_REMOTE}/{branch}")),
    )
}

/// Applies a [`GitSyncStrategy`] across a set of repositories.
pub struct GitSyncExecutor {
    vcs: Arc<dyn VcsIntegration>,
}

impl GitSyncExecutor {
    pub fn new(vcs: Arc<dyn VcsIntegration>) -> Self {
        Self { vcs }
    }

    /// Sync every repository. Results are in input order.
    ///
    /// `GitSyncStrategy::None` returns an empty vector without touching
    /// anything. A failed batch fetch marks every repository failed and
    /// skips merge/rebase entirely.
    pub async fn sync_all(
        &self,
        repositories: &[RepositoryHandle],
        strategy: GitSyncStrategy,
    ) -> Vec<RepositorySyncResult> {
        if strategy == GitSyncStrategy::None || repositories.is_empty() {
            return Vec::new();
        }

        info!(
            repositories = repositories.len(),
            strategy = %strategy,
            "Fetching all remotes"
        );
        let fetch = self.vcs.fetch_all_remotes(repositories).await;
        if !fetch.succeeded {
            let message = fetch
                .error_message
                .unwrap_or_else(|| FETCH_FAILED.to_string());
            warn!(error = %message, "Batch fetch failed; skipping merge/rebase");
            return repositories
                .iter()
                .map(|repo| {
                    emit_repository_synced(&repo.id, false);
                    RepositorySyncResult::failed(&repo.id, message.clone())
                })
                .collect();
        }

        join_all(
            repositories
                .iter()
                .map(|repo| self.sync_repository(repo, strategy)),
        )
        .await
    }

    async fn sync_repository(
        &self,
        repository: &RepositoryHandle,
        strategy: GitSyncStrategy,
    ) -> RepositorySyncResult {
        let Some(upstream) = resolve_upstream(repository) else {
            info!(repo = %repository.id, "No current branch; nothing to sync");
            emit_repository_synced(&repository.id, true);
            return RepositorySyncResult::ok(&repository.id);
        };

        info!(repo = %repository.id, upstream = %upstream, strategy = %strategy, "Syncing repository");

        let result = match strategy {
            GitSyncStrategy::Merge => self.vcs.merge(repository, &upstream).await,
            GitSyncStrategy::Rebase => {
                self.vcs
                    .rebase(repository, &RebaseParams { upstream })
                    .await
            }
            GitSyncStrategy::None => return RepositorySyncResult::ok(&repository.id),
        };

        emit_repository_synced(&repository.id, result.succeeded());
        if result.succeeded() {
            info!(repo = %repository.id, "{} succeeded", strategy);
            RepositorySyncResult::ok(&repository.id)
        } else {
            warn!(
                repo = %repository.id,
                exit_code = result.exit_code,
                "{} failed",
                strategy
            );
            RepositorySyncResult::failed(&repository.id, result.error_output())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_prefers_tracked_branch() {
        let repo = RepositoryHandle::new("r", "/r")
            .on_branch("feature")
            .tracking("upstream/develop");
        assert_eq!(resolve_upstream(&repo).as_deref(), Some("upstream/develop"));
    }

    #[test]
    fn test_upstream_falls_back_to_origin_branch() {
        let repo = RepositoryHandle::new("r", "/r").on_branch("main");
        assert_eq!(resolve_upstream(&repo).as_deref(), Some("origin/main"));
    }

    #[test]
    fn test_detached_head_has_no_upstream() {
        let repo = RepositoryHandle::new("r", "/r").tracking("origin/main");
        assert!(resolve_upstream(&repo).is_none());
    }
}
