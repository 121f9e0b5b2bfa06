//! Append-only, de-duplicated condition ledger.

use crate::issue::{
    domain::{ConditionUpdate, IssueResource},
    ports::IssueResourceStore,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a [`ConditionLedger::set_condition`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// The condition was appended and persisted.
    Recorded,
    /// A condition with the same reason and status already exists.
    AlreadyRecorded,
    /// The condition was appended locally but the status write failed.
    NotPersisted,
}

/// Records conditions on resource status.
///
/// Status writes are best-effort: failures are logged and never returned.
pub struct ConditionLedger<R, C>
where
    R: IssueResourceStore,
    C: Clock + Send + Sync,
{
    store: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for ConditionLedger<R, C>
where
    R: IssueResourceStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> ConditionLedger<R, C>
where
    R: IssueResourceStore,
    C: Clock + Send + Sync,
{
    /// Creates a ledger writing through `store`.
    #[must_use]
    pub const fn new(store: Arc<R>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Appends a condition unless its `(reason, status)` pair is already
    /// recorded, then persists the status subresource.
    ///
    /// On a successful write `resource` is replaced with the stored object so
    /// later writes carry the current version.
    pub async fn set_condition(
        &self,
        resource: &mut IssueResource,
        update: ConditionUpdate,
    ) -> LedgerOutcome {
        if resource.status.contains(&update.reason, update.status) {
            return LedgerOutcome::AlreadyRecorded;
        }

        let condition_type = update.condition_type;
        let status = update.status;
        resource
            .status
            .record(update.into_condition(self.clock.utc()));

        match self.store.update_status(resource).await {
            Ok(stored) => {
                debug!(
                    resource = %resource.key(),
                    condition = %condition_type,
                    %status,
                    "recorded condition"
                );
                *resource = stored;
                LedgerOutcome::Recorded
            }
            Err(err) => {
                warn!(
                    resource = %resource.key(),
                    condition = %condition_type,
                    error = %err,
                    "status update failed"
                );
                LedgerOutcome::NotPersisted
            }
        }
    }
}
