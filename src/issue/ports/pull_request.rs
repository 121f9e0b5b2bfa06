//! Extension point for pull request linkage.

use crate::issue::domain::{AccessToken, ConditionStatus, IssueResource, RemoteIssue};
use async_trait::async_trait;

/// Decides whether the remote issue has a linked pull request.
#[async_trait]
pub trait PullRequestDetector: Send + Sync {
    /// Returns the status to record for the `IssueHasPullRequest` condition.
    async fn detect(
        &self,
        resource: &IssueResource,
        issue: &RemoteIssue,
        token: &AccessToken,
    ) -> ConditionStatus;
}

/// Detector used until pull request linkage is tracked; always reports
/// [`ConditionStatus::Unknown`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownPullRequestDetector;

#[async_trait]
impl PullRequestDetector for UnknownPullRequestDetector {
    async fn detect(
        &self,
        _resource: &IssueResource,
        _issue: &RemoteIssue,
        _token: &AccessToken,
    ) -> ConditionStatus {
        ConditionStatus::Unknown
    }
}
