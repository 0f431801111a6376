//! Properties of the git sync executor.

use autobuild_core::fakes::{FakeVcs, VcsCall};
use autobuild_core::{CommandResult, GitSyncExecutor, GitSyncStrategy, RepositoryHandle};
use std::sync::Arc;

fn repos(n: usize) -> Vec<RepositoryHandle> {
    (0..n)
        .map(|i| RepositoryHandle::new(format!("repo{i}"), format!("/work/repo{i}")).on_branch("main"))
        .collect()
}

fn vcs_with(repositories: &[RepositoryHandle]) -> FakeVcs {
    repositories
        .iter()
        .cloned()
        .fold(FakeVcs::new(), FakeVcs::with_repository)
}

#[tokio::test]
async fn test_strategy_none_is_a_no_op() {
    let repositories = repos(3);
    let vcs = Arc::new(vcs_with(&repositories));
    let results = GitSyncExecutor::new(vcs.clone())
        .sync_all(&repositories, GitSyncStrategy::None)
        .await;

    assert!(results.is_empty());
    assert!(vcs.calls().is_empty());
}

#[tokio::test]
async fn test_batch_fetch_failure_fails_everything() {
    for n in 1..=4 {
        let repositories = repos(n);
        let vcs = Arc::new(vcs_with(&repositories).failing_fetch("fatal: unable to access"));
        for strategy in [GitSyncStrategy::Merge, GitSyncStrategy::Rebase] {
            let results = GitSyncExecutor::new(vcs.clone())
                .sync_all(&repositories, strategy)
                .await;
            assert_eq!(results.len(), n);
            assert!(results.iter().all(|r| !r.succeeded));
            assert!(results
                .iter()
                .all(|r| r.error_message.as_deref() == Some("fatal: unable to access")));
        }
        assert_eq!(vcs.mutation_count(), 0);
    }
}

#[tokio::test]
async fn test_single_failure_does_not_affect_others() {
    let repositories = repos(4);
    for failing in 0..repositories.len() {
        let id = repositories[failing].id.clone();
        let vcs = Arc::new(
            vcs_with(&repositories).with_outcome(&id, CommandResult::failure(1, "error: could not apply")),
        );
        let results = GitSyncExecutor::new(vcs.clone())
            .sync_all(&repositories, GitSyncStrategy::Rebase)
            .await;

        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.repository_id, repositories[i].id);
            assert_eq!(result.succeeded, i != failing);
        }
        assert_eq!(vcs.mutation_count(), repositories.len());
    }
}

#[tokio::test]
async fn test_detached_repository_is_trivially_ok() {
    let repositories = vec![
        RepositoryHandle::new("detached", "/work/detached"),
        RepositoryHandle::new("main", "/work/main").on_branch("main"),
    ];
    let vcs = Arc::new(vcs_with(&repositories));
    let results = GitSyncExecutor::new(vcs.clone())
        .sync_all(&repositories, GitSyncStrategy::Merge)
        .await;

    assert!(results.iter().all(|r| r.succeeded));
    assert_eq!(
        vcs.calls(),
        vec![
            VcsCall::Fetch(vec!["detached".to_string(), "main".to_string()]),
            VcsCall::Merge {
                repo: "main".to_string(),
                upstream: "origin/main".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_merge_failure_without_stderr_uses_stdout() {
    let repositories = repos(1);
    let vcs = Arc::new(vcs_with(&repositories).with_outcome(
        "repo0",
        CommandResult {
            exit_code: 1,
            stdout: "Automatic merge failed; fix conflicts and then commit the result.".to_string(),
            stderr: String::new(),
        },
    ));
    let results = GitSyncExecutor::new(vcs)
        .sync_all(&repositories, GitSyncStrategy::Merge)
        .await;

    assert_eq!(
        results[0].error_message.as_deref(),
        Some("Automatic merge failed; fix conflicts and then commit the result.")
    );
}
