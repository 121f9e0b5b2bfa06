//! Error types for issue domain validation.

use thiserror::Error;

/// Errors returned while constructing or validating issue domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IssueDomainError {
    /// The repository URL does not name an owner and a repository.
    #[error("invalid repository URL '{0}', expected https://github.com/<owner>/<repo>")]
    InvalidRepoUrl(String),

    /// The issue title is empty after trimming.
    #[error("issue title must not be empty")]
    EmptyIssueTitle,

    /// The issue number is invalid.
    #[error("invalid issue number {0}, expected a positive integer")]
    InvalidIssueNumber(u64),
}
