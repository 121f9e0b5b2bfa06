//! Controller loop driving the real reconciler.

use std::{sync::Arc, time::Duration};

use super::helpers::{Cluster, REPO_URL, VALID_TOKEN, repo};
use github_issue_operator::{
    issue::services::ReconcilerSettings,
    runtime::{ControllerRunner, RunnerSettings},
};
use rstest::{fixture, rstest};
use tokio::{sync::mpsc, time::{sleep, timeout}};

#[fixture]
fn fast_cluster() -> Cluster {
    Cluster::new(ReconcilerSettings {
        secret_created_requeue: Duration::from_millis(20),
        ..ReconcilerSettings::default()
    })
}

fn fast_runner_settings() -> RunnerSettings {
    RunnerSettings {
        max_concurrent_reconciles: 2,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(50),
        user_action_retry: Duration::from_millis(20),
    }
}

async fn eventually(mut condition: impl AsyncFnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !condition().await {
            sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition should hold before the timeout");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn single_trigger_converges_through_requeues(fast_cluster: Cluster) {
    let cluster = Arc::new(fast_cluster);
    let key = cluster.apply("bug", REPO_URL, "Bug", "body").await;
    let (tx, rx) = mpsc::channel(8);
    let runner = tokio::spawn(
        ControllerRunner::new(Arc::clone(&cluster.reconciler), fast_runner_settings()).run(rx),
    );

    tx.send(key.clone()).await.expect("trigger");
    eventually(async || cluster.has_secret(&key).await).await;
    cluster.provide_token(&key, VALID_TOKEN).await;
    eventually(async || !cluster.tracker.issues(&repo()).expect("issues").is_empty()).await;

    drop(tx);
    runner.await.expect("runner stops");
    assert_eq!(cluster.tracker.issues(&repo()).expect("issues").len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn burst_of_triggers_creates_one_issue(fast_cluster: Cluster) {
    let cluster = Arc::new(fast_cluster);
    let key = cluster.apply("bug", REPO_URL, "Bug", "body").await;
    cluster.reconcile(&key).await.expect("bootstrap");
    cluster.provide_token(&key, VALID_TOKEN).await;
    let (tx, rx) = mpsc::channel(32);
    for _ in 0..10 {
        tx.send(key.clone()).await.expect("trigger");
    }
    drop(tx);

    ControllerRunner::new(Arc::clone(&cluster.reconciler), fast_runner_settings())
        .run(rx)
        .await;

    assert_eq!(cluster.tracker.issues(&repo()).expect("issues").len(), 1);
    assert_eq!(cluster.tracker.calls().expect("calls").create, 1);
}
