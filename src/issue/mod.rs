//! Issue resource reconciliation.
//!
//! This module converges declarative `GithubIssue` resources with the remote
//! issue tracker. A reconcile pass bootstraps the per-object credential
//! secret, maintains the derived label index and deletion finalizer, creates
//! or updates the remote issue, and records the observed outcome as status
//! conditions. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
