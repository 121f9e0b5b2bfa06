//! The declarative issue resource.

use super::{
    Condition, ConditionStatus, ConditionType, IssueDomainError, ObjectKey, ObjectMeta,
    OwnerReference, RepoCoordinates,
};
use serde::{Deserialize, Serialize};

/// Kind name under which issue resources are stored.
pub const ISSUE_RESOURCE_KIND: &str = "GithubIssue";

/// Declared intent: an issue with this title and body should exist on the
/// repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSpec {
    /// Repository URL in `https://github.com/<owner>/<repo>` form.
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// Issue title; used as the remote lookup key.
    pub title: String,
    /// Issue body.
    #[serde(default)]
    pub description: String,
}

impl IssueSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(
        repo_url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Applies the admission rules for issue resources.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidRepoUrl`] when the repository URL is
    /// not a plain `https://github.com/<owner>/<repo>` URL, or
    /// [`IssueDomainError::EmptyIssueTitle`] for a blank title.
    pub fn validate(&self) -> Result<(), IssueDomainError> {
        RepoCoordinates::parse_strict(&self.repo_url)?;
        if self.title.trim().is_empty() {
            return Err(IssueDomainError::EmptyIssueTitle);
        }
        Ok(())
    }

    /// Returns the repository coordinates named by the spec.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidRepoUrl`] when the URL does not end
    /// in owner and repository segments.
    pub fn repo(&self) -> Result<RepoCoordinates, IssueDomainError> {
        RepoCoordinates::from_repo_url(&self.repo_url)
    }
}

/// Observed state of an issue resource.
///
/// The condition list is a ledger: entries are only appended, and a
/// condition whose `(reason, status)` pair is already present is not
/// recorded again. The list therefore holds at most one entry per pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStatus {
    /// Recorded conditions in the order they were observed.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl IssueStatus {
    /// Returns whether a condition with this reason and status was recorded.
    #[must_use]
    pub fn contains(&self, reason: &str, status: ConditionStatus) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.reason == reason && condition.status == status)
    }

    /// Appends a condition unless its `(reason, status)` pair is present.
    ///
    /// Returns `true` when the condition was appended.
    pub fn record(&mut self, condition: Condition) -> bool {
        if self.contains(&condition.reason, condition.status) {
            return false;
        }
        self.conditions.push(condition);
        true
    }

    /// Returns the most recently recorded condition of the given type.
    #[must_use]
    pub fn latest(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.conditions
            .iter()
            .rev()
            .find(|condition| condition.condition_type == condition_type)
    }
}

/// Issue resource aggregate: metadata, declared spec and observed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueResource {
    /// Object metadata.
    pub metadata: ObjectMeta,
    /// Declared intent.
    pub spec: IssueSpec,
    /// Observed status.
    #[serde(default)]
    pub status: IssueStatus,
}

impl IssueResource {
    /// Creates a new resource with empty status.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: IssueSpec) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec,
            status: IssueStatus::default(),
        }
    }

    /// Returns the namespaced key of the resource.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        self.metadata.key()
    }

    /// Returns whether deletion has been requested.
    #[must_use]
    pub const fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Returns whether the finalizer token is present.
    #[must_use]
    pub fn has_finalizer(&self, token: &str) -> bool {
        self.metadata.finalizers.iter().any(|entry| entry == token)
    }

    /// Adds a finalizer token. Returns `false` if it was already present.
    pub fn add_finalizer(&mut self, token: &str) -> bool {
        if self.has_finalizer(token) {
            return false;
        }
        self.metadata.finalizers.push(token.to_owned());
        true
    }

    /// Removes a finalizer token. Returns `false` if it was absent.
    pub fn remove_finalizer(&mut self, token: &str) -> bool {
        let before = self.metadata.finalizers.len();
        self.metadata.finalizers.retain(|entry| entry != token);
        self.metadata.finalizers.len() != before
    }

    /// Returns a label value.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata.labels.get(key).map(String::as_str)
    }

    /// Returns an owner reference pointing at this resource.
    #[must_use]
    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            kind: ISSUE_RESOURCE_KIND.to_owned(),
            name: self.metadata.name.clone(),
            uid: self.metadata.uid,
            controller: true,
        }
    }
}
