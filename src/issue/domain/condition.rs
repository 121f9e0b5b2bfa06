//! Status conditions recorded on issue resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state condition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
    /// The condition could not be determined.
    Unknown,
}

impl ConditionStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of facts recorded on an issue resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    /// The remote issue was opened.
    IssueOpen,
    /// The remote issue has a linked pull request.
    IssueHasPullRequest,
    /// Another resource now drives the remote issue description.
    IssueDescriptionUnaffected,
    /// The per-resource credential secret was created.
    AccessTokenSecretCreated,
    /// The tracker rejected the configured credential.
    BadCredentials,
}

impl ConditionType {
    /// Returns the canonical string form, also used as the default reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IssueOpen => "IssueOpen",
            Self::IssueHasPullRequest => "IssueHasPullRequest",
            Self::IssueDescriptionUnaffected => "IssueDescriptionUnaffected",
            Self::AccessTokenSecretCreated => "AccessTokenSecretCreated",
            Self::BadCredentials => "BadCredentials",
        }
    }

    const fn default_message(self, status: ConditionStatus) -> &'static str {
        match (self, status) {
            (Self::IssueOpen, ConditionStatus::True) => "Issue opened successfully on the tracker",
            (Self::IssueOpen, _) => "Issue could not be opened on the tracker",
            (Self::IssueHasPullRequest, ConditionStatus::True) => "Issue has a linked pull request",
            (Self::IssueHasPullRequest, ConditionStatus::False) => {
                "Issue has no linked pull request"
            }
            (Self::IssueHasPullRequest, ConditionStatus::Unknown) => {
                "Pull request linkage is not tracked"
            }
            (Self::IssueDescriptionUnaffected, ConditionStatus::True) => {
                "Issue description is no longer driven by this resource"
            }
            (Self::IssueDescriptionUnaffected, _) => "Issue description is driven by this resource",
            (Self::AccessTokenSecretCreated, ConditionStatus::True) => {
                "Created the access token secret; fill in the token to continue"
            }
            (Self::AccessTokenSecretCreated, _) => "Could not create the access token secret",
            (Self::BadCredentials, ConditionStatus::True) => {
                "Tracker rejected the access token; update the token in the credential secret"
            }
            (Self::BadCredentials, _) => "Tracker accepted the access token",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped fact recorded in a resource status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition kind.
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// Condition status.
    pub status: ConditionStatus,
    /// Machine-readable reason; together with `status` it identifies the entry.
    pub reason: String,
    /// Human-readable message.
    pub message: String,
    /// When the condition was recorded.
    pub last_transition_time: DateTime<Utc>,
}

/// Requested condition, before it is timestamped and recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionUpdate {
    /// Condition kind.
    pub condition_type: ConditionType,
    /// Condition status.
    pub status: ConditionStatus,
    /// Reason used for de-duplication.
    pub reason: String,
    /// Human-readable message.
    pub message: String,
}

impl ConditionUpdate {
    /// Creates a fully specified update.
    #[must_use]
    pub fn new(
        condition_type: ConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type,
            status,
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Creates an update using the default reason and message of the type.
    #[must_use]
    pub fn of(condition_type: ConditionType, status: ConditionStatus) -> Self {
        Self::new(
            condition_type,
            status,
            condition_type.as_str(),
            condition_type.default_message(status),
        )
    }

    /// Replaces the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Timestamps the update into a recordable condition.
    #[must_use]
    pub fn into_condition(self, at: DateTime<Utc>) -> Condition {
        Condition {
            condition_type: self.condition_type,
            status: self.status,
            reason: self.reason,
            message: self.message,
            last_transition_time: at,
        }
    }
}
