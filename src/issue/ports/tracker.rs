//! Port for the remote issue tracker.

use crate::issue::domain::{AccessToken, IssueNumber, IssuePatch, NewIssue, RemoteIssue, RepoCoordinates};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Remote issue tracker operations.
///
/// Every call carries the access token explicitly; adapters hold no
/// credential state of their own.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Lists the issues of a repository in tracker order.
    async fn list_issues(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
    ) -> TrackerResult<Vec<RemoteIssue>>;

    /// Creates an issue.
    async fn create_issue(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
        issue: &NewIssue,
    ) -> TrackerResult<RemoteIssue>;

    /// Applies a partial update to an issue.
    async fn update_issue(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
        number: IssueNumber,
        patch: &IssuePatch,
    ) -> TrackerResult<()>;
}

/// Errors returned by tracker adapters.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// The tracker rejected the access token. Retrying will not help until
    /// the token is replaced.
    #[error("bad credentials: the tracker rejected the access token")]
    Unauthorized,

    /// The tracker answered with an unexpected status.
    #[error("tracker returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The request could not be delivered.
    #[error("tracker transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The response could not be decoded.
    #[error("malformed tracker response: {0}")]
    Decode(String),
}

impl TrackerError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns whether the error needs the user to rotate the credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
