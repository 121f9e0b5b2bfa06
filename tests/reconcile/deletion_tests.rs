//! Finalizer-gated deletion scenarios.

use super::helpers::{Cluster, REPO_URL, cluster, repo};
use github_issue_operator::issue::{
    domain::RemoteIssueState,
    ports::{IssueResourceStore, TrackerError},
    services::Action,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deletion_closes_issue_then_releases_resource(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;
    cluster.reconcile(&key).await.expect("converge");

    cluster.store.delete(&key).await.expect("request deletion");
    assert!(cluster.stored(&key).await.is_terminating());

    let action = cluster.reconcile(&key).await.expect("finalize");

    assert_eq!(action, Action::Done);
    assert!(cluster.store.get(&key).await.expect("get").is_none());
    let issues = cluster.tracker.issues(&repo()).expect("issues");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].state, RemoteIssueState::Closed);
    assert!(!cluster.has_secret(&key).await);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tracker_failure_does_not_block_deletion(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;
    cluster.reconcile(&key).await.expect("converge");
    cluster
        .tracker
        .fail_next_list(TrackerError::Http {
            status: 503,
            body: "unavailable".to_owned(),
        })
        .expect("script failure");

    cluster.store.delete(&key).await.expect("request deletion");
    cluster.reconcile(&key).await.expect("finalize");

    assert!(cluster.store.get(&key).await.expect("get").is_none());
    let issues = cluster.tracker.issues(&repo()).expect("issues");
    assert_eq!(issues[0].state, RemoteIssueState::Open);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn already_closed_issue_is_not_patched(cluster: Cluster) {
    cluster
        .tracker
        .seed_issue(&repo(), "Bug", "body", RemoteIssueState::Closed)
        .expect("seed");
    let key = cluster.ready("bug", "Bug", "body").await;
    cluster.reconcile(&key).await.expect("converge");

    cluster.store.delete(&key).await.expect("request deletion");
    cluster.reconcile(&key).await.expect("finalize");

    assert!(cluster.store.get(&key).await.expect("get").is_none());
    assert_eq!(cluster.tracker.calls().expect("calls").update, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unfinalized_resource_deletes_without_tracker_calls(cluster: Cluster) {
    let key = cluster.apply("bug", REPO_URL, "Bug", "body").await;
    cluster.reconcile(&key).await.expect("bootstrap");

    cluster.store.delete(&key).await.expect("delete");

    assert!(cluster.store.get(&key).await.expect("get").is_none());
    assert!(!cluster.has_secret(&key).await);
    assert_eq!(cluster.reconcile(&key).await.expect("reconcile"), Action::Done);
    assert_eq!(cluster.tracker.calls().expect("calls").list, 0);
}
