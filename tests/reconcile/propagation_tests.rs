//! Description fan-out across resources sharing one remote issue.

use super::helpers::{Cluster, cluster, count_conditions, repo};
use github_issue_operator::issue::{
    domain::{ConditionStatus, ConditionType, IssueResource},
    ports::TrackerError,
    services::{ReconcileError, RetryHint, SyncError},
};
use rstest::rstest;

fn unaffected(resource: &IssueResource) -> Option<ConditionStatus> {
    resource
        .status
        .latest(ConditionType::IssueDescriptionUnaffected)
        .map(|condition| condition.status)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn siblings_with_other_descriptions_are_marked_unaffected(cluster: Cluster) {
    let first = cluster.ready("first", "Bug", "from first").await;
    let second = cluster.ready("second", "Bug", "from second").await;
    let other = cluster.ready("other", "Feature", "unrelated").await;
    for key in [&first, &other] {
        cluster.reconcile(key).await.expect("converge");
    }

    cluster.reconcile(&second).await.expect("second takes over");

    let issues = cluster.tracker.issues(&repo()).expect("issues");
    let bug = issues.iter().find(|issue| issue.title == "Bug").expect("bug issue");
    assert_eq!(bug.body_text(), "from second");
    assert_eq!(unaffected(&cluster.stored(&first).await), Some(ConditionStatus::True));
    assert_eq!(unaffected(&cluster.stored(&second).await), Some(ConditionStatus::False));
    assert_eq!(unaffected(&cluster.stored(&other).await), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn siblings_sharing_the_description_are_marked_affected(cluster: Cluster) {
    let first = cluster.ready("first", "Bug", "old").await;
    cluster.reconcile(&first).await.expect("converge first");
    let second = cluster.ready("second", "Bug", "new").await;
    cluster.reconcile(&second).await.expect("second updates");

    cluster.edit_description(&first, "newer").await;
    cluster.edit_description(&second, "newer").await;
    cluster.reconcile(&second).await.expect("second updates again");

    let first = cluster.stored(&first).await;
    assert_eq!(
        count_conditions(&first, ConditionType::IssueDescriptionUnaffected, ConditionStatus::True),
        1
    );
    assert_eq!(unaffected(&first), Some(ConditionStatus::False));
    assert_eq!(unaffected(&cluster.stored(&second).await), Some(ConditionStatus::False));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unchanged_sync_does_not_propagate(cluster: Cluster) {
    let first = cluster.ready("first", "Bug", "same").await;
    let second = cluster.ready("second", "Bug", "same").await;

    cluster.reconcile(&first).await.expect("create");
    cluster.reconcile(&second).await.expect("adopt");

    assert_eq!(unaffected(&cluster.stored(&first).await), None);
    assert_eq!(unaffected(&cluster.stored(&second).await), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_body_update_skips_fan_out(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;
    cluster.reconcile(&key).await.expect("converge");
    cluster.edit_description(&key, "edited").await;
    cluster
        .tracker
        .fail_next_update(TrackerError::Http {
            status: 500,
            body: "boom".to_owned(),
        })
        .expect("script failure");

    let err = cluster.reconcile(&key).await.expect_err("update fails");

    assert!(matches!(err, ReconcileError::Sync(SyncError::Update { .. })));
    assert_eq!(err.retry_hint(), RetryHint::Backoff);
    assert_eq!(unaffected(&cluster.stored(&key).await), None);
    let issues = cluster.tracker.issues(&repo()).expect("issues");
    assert_eq!(issues[0].body_text(), "body");

    cluster.reconcile(&key).await.expect("retry succeeds");

    assert_eq!(unaffected(&cluster.stored(&key).await), Some(ConditionStatus::False));
    let issues = cluster.tracker.issues(&repo()).expect("issues");
    assert_eq!(issues[0].body_text(), "edited");
}
