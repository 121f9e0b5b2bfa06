//! Application services for issue reconciliation.
//!
//! Each service owns one step of a reconcile pass; [`Reconciler`] composes
//! them into the per-invocation state machine.

mod conditions;
mod credentials;
mod finalizer;
mod labels;
mod propagation;
mod reconciler;
mod sync;

pub use conditions::{ConditionLedger, LedgerOutcome};
pub use credentials::{CredentialBootstrap, CredentialError, SecretProvisioning};
pub use finalizer::FinalizerLifecycle;
pub use labels::{LabelIndexError, LabelIndexMaintainer};
pub use propagation::{CrossResourcePropagator, PropagationError, PropagationReport};
pub use reconciler::{
    Action, DEFAULT_FINALIZER, ReconcileError, Reconciler, ReconcilerSettings, RetryHint,
};
pub use sync::{CloseOutcome, IssueSyncEngine, SyncError, SyncOutcome};
