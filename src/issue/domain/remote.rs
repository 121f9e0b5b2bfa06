//! Tracker-side issue shapes.

use super::IssueDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive issue number assigned by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(u64);

impl IssueNumber {
    /// Creates a validated issue number.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidIssueNumber`] when the value is zero.
    pub const fn new(value: u64) -> Result<Self, IssueDomainError> {
        if value == 0 {
            return Err(IssueDomainError::InvalidIssueNumber(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Open/closed state of a remote issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteIssueState {
    /// The issue is open.
    Open,
    /// The issue is closed.
    Closed,
}

/// Issue as listed by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    /// Tracker-assigned number.
    pub number: IssueNumber,
    /// Issue title.
    pub title: String,
    /// Issue body; the tracker reports `null` for an empty body.
    #[serde(default)]
    pub body: Option<String>,
    /// Open/closed state.
    pub state: RemoteIssueState,
}

impl RemoteIssue {
    /// Returns the body, treating a missing body as empty.
    #[must_use]
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Returns whether the issue is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == RemoteIssueState::Open
    }
}

/// Returns the first issue whose title matches exactly, in listing order.
///
/// Titles are assumed unique per repository; later duplicates are ignored.
#[must_use]
pub fn find_by_title<'a>(issues: &'a [RemoteIssue], title: &str) -> Option<&'a RemoteIssue> {
    issues.iter().find(|issue| issue.title == title)
}

/// Payload for creating a remote issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Issue title.
    pub title: String,
    /// Issue body.
    pub body: String,
}

/// Partial update of a remote issue; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssuePatch {
    /// Replacement body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Replacement state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RemoteIssueState>,
}

impl IssuePatch {
    /// Creates a patch that replaces the body.
    #[must_use]
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            state: None,
        }
    }

    /// Creates a patch that closes the issue.
    #[must_use]
    pub const fn close() -> Self {
        Self {
            body: None,
            state: Some(RemoteIssueState::Closed),
        }
    }
}
