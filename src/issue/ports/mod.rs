//! Port contracts for issue reconciliation.
//!
//! Ports define infrastructure-agnostic interfaces used by the reconcile
//! services: the resource store holding issue resources, the secret store
//! holding credentials, and the remote issue tracker.

pub mod pull_request;
pub mod resource_store;
pub mod secret_store;
pub mod tracker;

pub use pull_request::{PullRequestDetector, UnknownPullRequestDetector};
pub use resource_store::{IssueResourceStore, StoreError, StoreResult};
pub use secret_store::SecretStore;
pub use tracker::{IssueTracker, TrackerError, TrackerResult};
