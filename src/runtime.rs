//! Controller loop that schedules reconciles.
//!
//! Triggers arrive as [`ObjectKey`]s on a channel. Each key is reconciled by
//! at most one task at a time; a trigger that arrives while its key is in
//! flight marks the key dirty and it runs once more afterwards. Total
//! concurrency is bounded by a semaphore. Failed passes are retried
//! according to their [`RetryHint`].

use crate::issue::{
    domain::ObjectKey,
    ports::{IssueResourceStore, IssueTracker, SecretStore},
    services::{Action, ReconcileError, Reconciler, RetryHint},
};
use async_trait::async_trait;
use mockable::Clock;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

/// Something that can reconcile a single key.
#[async_trait]
pub trait Reconcile: Send + Sync + 'static {
    /// Runs one reconcile pass for `key`.
    async fn reconcile(&self, key: &ObjectKey) -> Result<Action, ReconcileError>;
}

#[async_trait]
impl<R, K, T, C> Reconcile for Reconciler<R, K, T, C>
where
    R: IssueResourceStore + 'static,
    K: SecretStore + 'static,
    T: IssueTracker + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn reconcile(&self, key: &ObjectKey) -> Result<Action, ReconcileError> {
        Self::reconcile(self, key).await
    }
}

/// Scheduling limits for [`ControllerRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Upper bound on concurrently running reconciles.
    pub max_concurrent_reconciles: usize,
    /// First backoff delay.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
    /// Fixed delay for failures that need user action.
    pub user_action_retry: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_reconciles: 4,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(300),
            user_action_retry: Duration::from_secs(300),
        }
    }
}

/// Exponential backoff for the `attempt`-th consecutive failure, capped at
/// `max`.
#[must_use]
pub fn backoff_delay(initial: Duration, max: Duration, attempt: u32) -> Duration {
    initial
        .saturating_mul(2_u32.saturating_pow(attempt))
        .min(max)
}

enum Event {
    Requeue(ObjectKey),
    Finished(ObjectKey, Result<Action, ReconcileError>),
}

#[derive(Default)]
struct KeyQueue {
    in_flight: HashSet<ObjectKey>,
    dirty: HashSet<ObjectKey>,
    failures: HashMap<ObjectKey, u32>,
}

/// Drives a [`Reconcile`] implementation from a stream of triggers.
pub struct ControllerRunner<R: Reconcile> {
    reconciler: Arc<R>,
    settings: RunnerSettings,
    permits: Arc<Semaphore>,
}

impl<R: Reconcile> ControllerRunner<R> {
    /// Creates a runner.
    #[must_use]
    pub fn new(reconciler: Arc<R>, settings: RunnerSettings) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_reconciles.max(1)));
        Self {
            reconciler,
            settings,
            permits,
        }
    }

    /// Runs until `triggers` closes and in-flight work has drained.
    ///
    /// Keys marked dirty before the channel closed still get their extra
    /// pass; timed requeues are dropped once draining starts.
    pub async fn run(self, mut triggers: mpsc::Receiver<ObjectKey>) {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut queue = KeyQueue::default();
        let mut accepting = true;

        loop {
            if !accepting && queue.in_flight.is_empty() {
                break;
            }
            tokio::select! {
                trigger = triggers.recv(), if accepting => match trigger {
                    Some(key) => self.dispatch(key, &mut queue, &events_tx),
                    None => {
                        info!(in_flight = queue.in_flight.len(), "trigger source closed; draining");
                        accepting = false;
                    }
                },
                Some(event) = events_rx.recv() => match event {
                    Event::Requeue(key) => {
                        if accepting {
                            self.dispatch(key, &mut queue, &events_tx);
                        }
                    }
                    Event::Finished(key, result) => {
                        queue.in_flight.remove(&key);
                        let rerun = queue.dirty.remove(&key);
                        if accepting {
                            self.schedule(&key, result, &mut queue, &events_tx);
                        }
                        if rerun {
                            self.dispatch(key, &mut queue, &events_tx);
                        }
                    }
                },
            }
        }
        debug!("controller loop stopped");
    }

    fn dispatch(
        &self,
        key: ObjectKey,
        queue: &mut KeyQueue,
        events_tx: &mpsc::UnboundedSender<Event>,
    ) {
        if queue.in_flight.contains(&key) {
            queue.dirty.insert(key);
            return;
        }
        queue.in_flight.insert(key.clone());

        let reconciler = Arc::clone(&self.reconciler);
        let permits = Arc::clone(&self.permits);
        let events = events_tx.clone();
        tokio::spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => reconciler.reconcile(&key).await,
                Err(err) => {
                    warn!(resource = %key, error = %err, "concurrency limiter closed");
                    Ok(Action::Done)
                }
            };
            if events.send(Event::Finished(key, result)).is_err() {
                debug!("controller loop gone; dropping result");
            }
        });
    }

    fn schedule(
        &self,
        key: &ObjectKey,
        result: Result<Action, ReconcileError>,
        queue: &mut KeyQueue,
        events_tx: &mpsc::UnboundedSender<Event>,
    ) {
        let delay = match result {
            Ok(Action::Done) => {
                queue.failures.remove(key);
                return;
            }
            Ok(Action::RequeueAfter(delay)) => {
                queue.failures.remove(key);
                delay
            }
            Err(err) => {
                let hint = err.retry_hint();
                let delay = match hint {
                    RetryHint::Immediate => Duration::ZERO,
                    RetryHint::AwaitUserAction => self.settings.user_action_retry,
                    RetryHint::Backoff => {
                        let attempt = queue.failures.entry(key.clone()).or_insert(0);
                        let delay = backoff_delay(
                            self.settings.initial_backoff,
                            self.settings.max_backoff,
                            *attempt,
                        );
                        *attempt = attempt.saturating_add(1);
                        delay
                    }
                };
                warn!(resource = %key, error = %err, ?hint, ?delay, "reconcile failed");
                delay
            }
        };

        if delay.is_zero() {
            if events_tx.send(Event::Requeue(key.clone())).is_err() {
                debug!("controller loop gone; dropping requeue");
            }
            return;
        }
        let events = events_tx.clone();
        let requeued = key.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(Event::Requeue(requeued)).is_err() {
                debug!("controller loop gone; dropping requeue");
            }
        });
    }
}
