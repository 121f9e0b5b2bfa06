//! Adapter implementations for issue reconciliation ports.

pub mod github;
pub mod memory;

pub use github::GithubIssueTracker;
