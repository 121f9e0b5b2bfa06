//! In-memory adapters for tests and deterministic local runs.

mod store;
mod tracker;

pub use store::InMemoryClusterStore;
pub use tracker::{InMemoryIssueTracker, TrackerCalls};
