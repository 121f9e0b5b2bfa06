//! Domain model for issue reconciliation.
//!
//! The domain describes the declarative issue resource, its condition
//! ledger, the derived label index and the tracker-side issue shape. All
//! infrastructure concerns stay outside of the domain boundary.

mod condition;
mod credential;
mod error;
mod labels;
mod meta;
mod remote;
mod repository;
mod resource;

pub use condition::{Condition, ConditionStatus, ConditionType, ConditionUpdate};
pub use credential::{AccessToken, PLACEHOLDER_TOKEN, Secret};
pub use error::IssueDomainError;
pub use labels::{CanonicalLabels, LabelKeys, LabelSelector};
pub use meta::{ObjectKey, ObjectMeta, OwnerReference};
pub use remote::{IssueNumber, IssuePatch, NewIssue, RemoteIssue, RemoteIssueState, find_by_title};
pub use repository::RepoCoordinates;
pub use resource::{ISSUE_RESOURCE_KIND, IssueResource, IssueSpec, IssueStatus};
