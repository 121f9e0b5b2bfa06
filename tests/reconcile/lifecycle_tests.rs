//! Create, converge and credential scenarios.

use super::helpers::{Cluster, REPO_URL, VALID_TOKEN, cluster, count_conditions, repo};
use async_trait::async_trait;
use github_issue_operator::issue::{
    domain::{
        AccessToken, ConditionStatus, ConditionType, IssuePatch, IssueResource, RemoteIssue,
        RemoteIssueState,
    },
    ports::{IssueResourceStore, PullRequestDetector, StoreError, TrackerError},
    services::{Action, ReconcileError, Reconciler, ReconcilerSettings, RetryHint, SyncError},
};
use mockable::DefaultClock;
use rstest::rstest;
use std::{sync::Arc, time::Duration};

struct LinkedPullRequest;

#[async_trait]
impl PullRequestDetector for LinkedPullRequest {
    async fn detect(
        &self,
        _resource: &IssueResource,
        _issue: &RemoteIssue,
        _token: &AccessToken,
    ) -> ConditionStatus {
        ConditionStatus::True
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_pass_bootstraps_secret_and_requeues(cluster: Cluster) {
    let key = cluster.apply("bug", REPO_URL, "Bug", "body").await;

    let action = cluster.reconcile(&key).await.expect("reconcile");

    assert_eq!(action, Action::RequeueAfter(Duration::from_secs(5)));
    assert!(cluster.has_secret(&key).await);
    let resource = cluster.stored(&key).await;
    assert_eq!(
        count_conditions(&resource, ConditionType::AccessTokenSecretCreated, ConditionStatus::True),
        1
    );
    assert_eq!(cluster.tracker.calls().expect("calls").list, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creates_remote_issue_exactly_once(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;

    for _ in 0..3 {
        assert_eq!(cluster.reconcile(&key).await.expect("reconcile"), Action::Done);
    }

    let issues = cluster.tracker.issues(&repo()).expect("issues");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].title, "Bug");
    assert_eq!(issues[0].body_text(), "body");
    let calls = cluster.tracker.calls().expect("calls");
    assert_eq!((calls.list, calls.create, calls.update), (3, 1, 0));

    let resource = cluster.stored(&key).await;
    assert_eq!(count_conditions(&resource, ConditionType::IssueOpen, ConditionStatus::True), 1);
    assert_eq!(
        count_conditions(&resource, ConditionType::IssueHasPullRequest, ConditionStatus::Unknown),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unchanged_resource_is_not_rewritten(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;
    cluster.reconcile(&key).await.expect("converge");
    let before = cluster.stored(&key).await;

    cluster.reconcile(&key).await.expect("second pass");

    let after = cluster.stored(&key).await;
    assert_eq!(after, before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn adopts_existing_issue_with_same_title(cluster: Cluster) {
    cluster
        .tracker
        .seed_issue(&repo(), "Bug", "body", RemoteIssueState::Open)
        .expect("seed");
    let key = cluster.ready("bug", "Bug", "body").await;

    cluster.reconcile(&key).await.expect("reconcile");

    let calls = cluster.tracker.calls().expect("calls");
    assert_eq!((calls.create, calls.update), (0, 0));
    let resource = cluster.stored(&key).await;
    assert!(resource.status.latest(ConditionType::IssueOpen).is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn description_drift_updates_remote_body(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "first").await;
    cluster.reconcile(&key).await.expect("converge");

    cluster.edit_description(&key, "second").await;
    cluster.reconcile(&key).await.expect("reconcile edit");

    let issues = cluster.tracker.issues(&repo()).expect("issues");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].body_text(), "second");
    let calls = cluster.tracker.calls().expect("calls");
    assert_eq!(calls.patches, vec![(issues[0].number, IssuePatch::body("second"))]);
    let resource = cluster.stored(&key).await;
    assert_eq!(
        count_conditions(
            &resource,
            ConditionType::IssueDescriptionUnaffected,
            ConditionStatus::False
        ),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn labels_are_canonicalised(cluster: Cluster) {
    let key = cluster.apply("bug", "https://github.com/acme/widgets/", "Bug", "body").await;
    let mut resource = cluster.stored(&key).await;
    resource
        .metadata
        .labels
        .insert("issues.operator.io/repo".to_owned(), "someone.else".to_owned());
    cluster
        .store
        .update(&resource)
        .await
        .expect("write stale label");
    cluster.reconcile(&key).await.expect("bootstrap");
    cluster.provide_token(&key, VALID_TOKEN).await;

    cluster.reconcile(&key).await.expect("reconcile");

    let resource = cluster.stored(&key).await;
    assert_eq!(resource.label("issues.operator.io/repo"), Some("acme.widgets"));
    assert_eq!(resource.label("issues.operator.io/title"), Some("Bug"));
    assert!(resource.has_finalizer("issues.operator.io/close-remote-issue"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn placeholder_token_records_durable_bad_credentials(cluster: Cluster) {
    let key = cluster.apply("bug", REPO_URL, "Bug", "body").await;
    cluster.reconcile(&key).await.expect("bootstrap");

    let err = cluster
        .reconcile(&key)
        .await
        .expect_err("placeholder token is rejected");
    assert!(matches!(err, ReconcileError::Sync(SyncError::List(TrackerError::Unauthorized))));
    assert_eq!(err.retry_hint(), RetryHint::AwaitUserAction);
    cluster.reconcile(&key).await.expect_err("still rejected");

    let resource = cluster.stored(&key).await;
    assert_eq!(
        count_conditions(&resource, ConditionType::BadCredentials, ConditionStatus::True),
        1
    );
    assert!(cluster.tracker.issues(&repo()).expect("issues").is_empty());

    cluster.provide_token(&key, VALID_TOKEN).await;
    cluster.reconcile(&key).await.expect("valid token");

    let resource = cluster.stored(&key).await;
    assert_eq!(
        count_conditions(&resource, ConditionType::BadCredentials, ConditionStatus::False),
        0
    );
    assert_eq!(count_conditions(&resource, ConditionType::IssueOpen, ConditionStatus::True), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revoked_token_leaves_bad_credentials_as_latest_entry(cluster: Cluster) {
    let key = cluster.apply("bug", REPO_URL, "Bug", "body").await;
    cluster.reconcile(&key).await.expect("bootstrap");
    cluster.reconcile(&key).await.expect_err("placeholder token is rejected");
    cluster.provide_token(&key, VALID_TOKEN).await;
    cluster.reconcile(&key).await.expect("valid token");
    cluster.provide_token(&key, "ghp_revoked").await;

    let err = cluster.reconcile(&key).await.expect_err("revoked token is rejected");

    assert!(matches!(err, ReconcileError::Sync(SyncError::List(TrackerError::Unauthorized))));
    let resource = cluster.stored(&key).await;
    let latest = resource
        .status
        .latest(ConditionType::BadCredentials)
        .expect("bad credentials condition");
    assert_eq!(latest.status, ConditionStatus::True);
    assert_eq!(
        count_conditions(&resource, ConditionType::BadCredentials, ConditionStatus::False),
        0
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_failure_records_issue_not_open(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;
    cluster
        .tracker
        .fail_next_create(TrackerError::Http {
            status: 502,
            body: "bad gateway".to_owned(),
        })
        .expect("script failure");

    let err = cluster.reconcile(&key).await.expect_err("create fails");

    assert_eq!(err.retry_hint(), RetryHint::Backoff);
    let resource = cluster.stored(&key).await;
    let open = resource
        .status
        .latest(ConditionType::IssueOpen)
        .expect("issue open condition");
    assert_eq!(open.status, ConditionStatus::False);
    assert!(open.message.contains("502"));

    cluster.reconcile(&key).await.expect("retry succeeds");
    assert_eq!(cluster.tracker.issues(&repo()).expect("issues").len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lost_label_write_race_retries_immediately(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;
    cluster
        .store
        .fail_updates_with(Some(StoreError::Conflict {
            key: key.clone(),
            expected: 1,
            actual: 2,
        }))
        .expect("script conflict");

    let err = cluster.reconcile(&key).await.expect_err("conflict");

    assert!(matches!(err, ReconcileError::Labels(_)));
    assert_eq!(err.retry_hint(), RetryHint::Immediate);
    assert_eq!(cluster.tracker.calls().expect("calls").list, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn label_write_failure_does_not_block_sync(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;
    cluster.reconcile(&key).await.expect("converge");
    let mut resource = cluster.stored(&key).await;
    resource.spec.title = "Renamed".to_owned();
    cluster.store.update(&resource).await.expect("rename");
    cluster
        .store
        .fail_updates_with(Some(StoreError::persistence(std::io::Error::other("down"))))
        .expect("script failure");

    let action = cluster.reconcile(&key).await.expect("sync proceeds");

    assert_eq!(action, Action::Done);
    let titles: Vec<_> = cluster
        .tracker
        .issues(&repo())
        .expect("issues")
        .into_iter()
        .map(|issue| issue.title)
        .collect();
    assert_eq!(titles, vec!["Bug".to_owned(), "Renamed".to_owned()]);
    assert_eq!(cluster.stored(&key).await.label("issues.operator.io/title"), Some("Bug"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_resource_is_done() {
    let cluster = Cluster::new(Default::default());
    let key = github_issue_operator::issue::domain::ObjectKey::new("default", "ghost");

    assert_eq!(cluster.reconcile(&key).await.expect("reconcile"), Action::Done);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn custom_detector_sets_pull_request_condition(cluster: Cluster) {
    let key = cluster.ready("bug", "Bug", "body").await;
    let reconciler = Reconciler::new(
        Arc::clone(&cluster.store),
        Arc::clone(&cluster.store),
        Arc::clone(&cluster.tracker),
        Arc::new(DefaultClock),
        ReconcilerSettings::default(),
    )
    .with_pull_request_detector(Arc::new(LinkedPullRequest));

    let action = reconciler.reconcile(&key).await.expect("reconcile");

    assert_eq!(action, Action::Done);
    let resource = cluster.stored(&key).await;
    let linked = resource
        .status
        .latest(ConditionType::IssueHasPullRequest)
        .expect("pull request condition");
    assert_eq!(linked.status, ConditionStatus::True);
}
