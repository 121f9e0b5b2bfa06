//! Per-resource reconciliation state machine.

use super::{
    conditions::ConditionLedger,
    credentials::{CredentialBootstrap, CredentialError, SecretProvisioning},
    finalizer::FinalizerLifecycle,
    labels::{LabelIndexError, LabelIndexMaintainer},
    propagation::CrossResourcePropagator,
    sync::{CloseOutcome, IssueSyncEngine, SyncError, SyncOutcome},
};
use crate::issue::{
    domain::{ConditionStatus, ConditionType, ConditionUpdate, IssueResource, LabelKeys, ObjectKey},
    ports::{
        IssueResourceStore, IssueTracker, PullRequestDetector, SecretStore, StoreError,
        UnknownPullRequestDetector,
    },
};
use mockable::Clock;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Default finalizer token guarding remote cleanup.
pub const DEFAULT_FINALIZER: &str = "issues.operator.io/close-remote-issue";

/// What the runtime should do after a successful reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Wait for the next trigger.
    Done,
    /// Reconcile again after the delay.
    RequeueAfter(Duration),
}

/// How the runtime should retry a failed reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// Retry at once; the failure was a lost write race.
    Immediate,
    /// Retry with per-key exponential backoff.
    Backoff,
    /// Retry on a slow fixed cadence; a user must fix something first.
    AwaitUserAction,
}

/// Errors that abort a reconcile pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A resource store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing canonical labels lost a write race.
    #[error(transparent)]
    Labels(#[from] LabelIndexError),

    /// Credential bootstrap or lookup failed.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Remote synchronisation failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl ReconcileError {
    /// Classifies the error for the runtime's retry policy.
    #[must_use]
    pub fn retry_hint(&self) -> RetryHint {
        match self {
            Self::Store(err) if err.is_conflict() => RetryHint::Immediate,
            Self::Labels(err) if err.is_conflict() => RetryHint::Immediate,
            Self::Credentials(err) if err.store_error().is_some_and(StoreError::is_conflict) => {
                RetryHint::Immediate
            }
            Self::Sync(err) if err.is_unauthorized() => RetryHint::AwaitUserAction,
            Self::Store(_) | Self::Labels(_) | Self::Credentials(_) | Self::Sync(_) => {
                RetryHint::Backoff
            }
        }
    }
}

/// Names and delays the reconciler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Finalizer token added to live resources.
    pub finalizer: String,
    /// Canonical label keys.
    pub label_keys: LabelKeys,
    /// Suffix appended to the resource name to form the secret name.
    pub secret_name_suffix: String,
    /// Secret entry holding the access token.
    pub token_key: String,
    /// Delay before reconciling again after a placeholder secret is made.
    pub secret_created_requeue: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            finalizer: DEFAULT_FINALIZER.to_owned(),
            label_keys: LabelKeys::default(),
            secret_name_suffix: "github-auth".to_owned(),
            token_key: "token".to_owned(),
            secret_created_requeue: Duration::from_secs(5),
        }
    }
}

/// Drives one `GithubIssue` resource toward its desired state.
///
/// A pass re-reads the resource and then either runs the deletion branch
/// or walks credentials, labels, finalizer, remote sync, propagation and
/// pull-request detection in that order.
pub struct Reconciler<R, K, T, C>
where
    R: IssueResourceStore,
    K: SecretStore,
    T: IssueTracker,
    C: Clock + Send + Sync,
{
    resources: Arc<R>,
    ledger: ConditionLedger<R, C>,
    credentials: CredentialBootstrap<K>,
    finalizers: FinalizerLifecycle<R>,
    labels: LabelIndexMaintainer<R>,
    sync: IssueSyncEngine<T>,
    propagator: CrossResourcePropagator<R, C>,
    pull_requests: Arc<dyn PullRequestDetector>,
    secret_created_requeue: Duration,
}

impl<R, K, T, C> Reconciler<R, K, T, C>
where
    R: IssueResourceStore,
    K: SecretStore,
    T: IssueTracker,
    C: Clock + Send + Sync,
{
    /// Wires the reconciler's services over the given ports.
    #[must_use]
    pub fn new(
        resources: Arc<R>,
        secrets: Arc<K>,
        tracker: Arc<T>,
        clock: Arc<C>,
        settings: ReconcilerSettings,
    ) -> Self {
        let ledger = ConditionLedger::new(Arc::clone(&resources), clock);
        Self {
            credentials: CredentialBootstrap::new(
                secrets,
                settings.secret_name_suffix,
                settings.token_key,
            ),
            finalizers: FinalizerLifecycle::new(Arc::clone(&resources), settings.finalizer),
            labels: LabelIndexMaintainer::new(Arc::clone(&resources), settings.label_keys.clone()),
            sync: IssueSyncEngine::new(tracker),
            propagator: CrossResourcePropagator::new(
                Arc::clone(&resources),
                ledger.clone(),
                settings.label_keys,
            ),
            ledger,
            resources,
            pull_requests: Arc::new(UnknownPullRequestDetector),
            secret_created_requeue: settings.secret_created_requeue,
        }
    }

    /// Replaces the pull-request detector.
    #[must_use]
    pub fn with_pull_request_detector(mut self, detector: Arc<dyn PullRequestDetector>) -> Self {
        self.pull_requests = detector;
        self
    }

    /// Reconciles the resource named by `key`.
    ///
    /// A resource that no longer exists is treated as done.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when a step that gates progress fails.
    /// Condition writes and remote cleanup on deletion never fail the pass.
    #[instrument(skip_all, fields(resource = %key))]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Action, ReconcileError> {
        let Some(mut resource) = self.resources.get(key).await? else {
            debug!("resource no longer exists");
            return Ok(Action::Done);
        };
        if resource.is_terminating() {
            return self.finalize(&mut resource).await;
        }
        self.apply(&mut resource).await
    }

    async fn finalize(&self, resource: &mut IssueResource) -> Result<Action, ReconcileError> {
        if !resource.has_finalizer(self.finalizers.token()) {
            return Ok(Action::Done);
        }
        self.close_remote_issue(resource).await;
        self.finalizers.remove(resource).await?;
        info!("finalizer removed");
        Ok(Action::Done)
    }

    async fn close_remote_issue(&self, resource: &IssueResource) {
        let token = match self.credentials.load_token(resource).await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "no credentials; leaving remote issue open");
                return;
            }
        };
        match self.sync.close(&resource.spec, &token).await {
            Ok(CloseOutcome::Closed(number)) => info!(%number, "closed remote issue"),
            Ok(CloseOutcome::AlreadyClosed(number)) => debug!(%number, "remote issue already closed"),
            Ok(CloseOutcome::NotFound) => debug!("no remote issue to close"),
            Err(err) => warn!(error = %err, "could not close remote issue"),
        }
    }

    async fn apply(&self, resource: &mut IssueResource) -> Result<Action, ReconcileError> {
        match self.credentials.ensure_secret(resource).await {
            Ok(SecretProvisioning::Existing) => {}
            Ok(SecretProvisioning::Created) => {
                self.record(resource, ConditionType::AccessTokenSecretCreated, ConditionStatus::True)
                    .await;
                return Ok(Action::RequeueAfter(self.secret_created_requeue));
            }
            Err(err) => {
                if matches!(err, CredentialError::Create { .. }) {
                    self.record(
                        resource,
                        ConditionType::AccessTokenSecretCreated,
                        ConditionStatus::False,
                    )
                    .await;
                }
                return Err(err.into());
            }
        }

        let token = self.credentials.load_token(resource).await?;
        if token.is_placeholder() {
            debug!("credential secret still holds the placeholder token");
        }

        match self.labels.ensure_labels(resource).await {
            Ok(changed) => {
                if changed {
                    debug!("canonical labels applied");
                }
            }
            Err(err) if err.is_conflict() => return Err(err.into()),
            Err(err) => warn!(error = %err, "could not maintain labels; continuing"),
        }

        self.finalizers.ensure_present(resource).await?;

        let outcome = match self.sync.sync(&resource.spec, &token).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.record_sync_failure(resource, &err).await;
                return Err(err.into());
            }
        };
        self.record_sync_success(resource, &outcome).await;

        if outcome.description_changed() {
            match self.propagator.propagate(resource).await {
                Ok(report) => debug!(?report, "description change propagated"),
                Err(err) => warn!(error = %err, "could not propagate description change"),
            }
        }

        let linked = self.pull_requests.detect(resource, outcome.issue(), &token).await;
        self.record(resource, ConditionType::IssueHasPullRequest, linked).await;
        Ok(Action::Done)
    }

    async fn record_sync_failure(&self, resource: &mut IssueResource, err: &SyncError) {
        if matches!(err, SyncError::Create(_)) {
            self.record_with_message(
                resource,
                ConditionUpdate::of(ConditionType::IssueOpen, ConditionStatus::False),
                err,
            )
            .await;
        }
        if err.is_unauthorized() {
            self.record(resource, ConditionType::BadCredentials, ConditionStatus::True)
                .await;
        }
    }

    async fn record_sync_success(&self, resource: &mut IssueResource, outcome: &SyncOutcome) {
        if matches!(outcome, SyncOutcome::Created(_)) {
            self.record(resource, ConditionType::IssueOpen, ConditionStatus::True)
                .await;
        }
    }

    async fn record(
        &self,
        resource: &mut IssueResource,
        condition_type: ConditionType,
        status: ConditionStatus,
    ) {
        self.ledger
            .set_condition(resource, ConditionUpdate::of(condition_type, status))
            .await;
    }

    async fn record_with_message(
        &self,
        resource: &mut IssueResource,
        update: ConditionUpdate,
        err: &SyncError,
    ) {
        self.ledger
            .set_condition(resource, update.with_message(err.to_string()))
            .await;
    }
}
