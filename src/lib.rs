//! GitHub issue operator: declarative issue resources reconciled against a
//! remote tracker.
//!
//! Each `GithubIssue` resource names a repository, a title and a
//! description. The operator keeps exactly one remote issue with that title
//! open and its body in line with the description, closes it when the
//! resource is deleted, and reports what it observed as status conditions.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: resource, condition and remote issue types
//! - **Ports**: resource store, secret store and tracker traits
//! - **Adapters**: in-memory cluster and tracker, GitHub REST client
//! - **Services**: the per-resource reconciler and its steps
//!
//! # Modules
//!
//! - [`issue`]: reconciliation domain, ports, adapters and services
//! - [`runtime`]: single-flight controller loop
//! - [`config`]: layered configuration
//! - [`telemetry`]: tracing subscriber setup

pub mod config;
pub mod issue;
pub mod runtime;
pub mod telemetry;
