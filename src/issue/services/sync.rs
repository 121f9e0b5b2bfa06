//! Remote issue synchronisation keyed on title.

use crate::issue::{
    domain::{
        AccessToken, IssueDomainError, IssueNumber, IssuePatch, IssueSpec, NewIssue, RemoteIssue,
        find_by_title,
    },
    ports::{IssueTracker, TrackerError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// What a sync pass did to the remote issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No issue with the title existed, so one was created.
    Created(RemoteIssue),
    /// The issue existed with a different body and was updated.
    Updated(RemoteIssue),
    /// The issue existed and already matched.
    Unchanged(RemoteIssue),
}

impl SyncOutcome {
    /// Returns the remote issue as it stands after the pass.
    #[must_use]
    pub const fn issue(&self) -> &RemoteIssue {
        match self {
            Self::Created(issue) | Self::Updated(issue) | Self::Unchanged(issue) => issue,
        }
    }

    /// Returns `true` when an existing issue's body was rewritten.
    #[must_use]
    pub const fn description_changed(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

/// What a close pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The open issue was closed.
    Closed(IssueNumber),
    /// The issue was already closed.
    AlreadyClosed(IssueNumber),
    /// No issue with the title exists.
    NotFound,
}

/// Errors raised while synchronising with the tracker.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The spec does not identify a repository.
    #[error(transparent)]
    Domain(#[from] IssueDomainError),

    /// Listing remote issues failed.
    #[error("could not list remote issues: {0}")]
    List(#[source] TrackerError),

    /// Creating the remote issue failed.
    #[error("could not create remote issue: {0}")]
    Create(#[source] TrackerError),

    /// Updating the remote issue failed.
    #[error("could not update remote issue #{number}: {source}")]
    Update {
        /// Remote issue number.
        number: IssueNumber,
        /// Tracker failure.
        #[source]
        source: TrackerError,
    },
}

impl SyncError {
    /// Returns the tracker failure behind this error, if any.
    #[must_use]
    pub const fn tracker_error(&self) -> Option<&TrackerError> {
        match self {
            Self::List(err) | Self::Create(err) | Self::Update { source: err, .. } => Some(err),
            Self::Domain(_) => None,
        }
    }

    /// Returns `true` when the tracker rejected the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.tracker_error().is_some_and(TrackerError::is_unauthorized)
    }
}

/// Drives the remote issue toward the desired title and body.
pub struct IssueSyncEngine<T: IssueTracker> {
    tracker: Arc<T>,
}

impl<T: IssueTracker> IssueSyncEngine<T> {
    /// Creates the engine over a tracker.
    #[must_use]
    pub const fn new(tracker: Arc<T>) -> Self {
        Self { tracker }
    }

    /// Lists the repository's issues once and creates or updates the one
    /// matching `spec.title`. The first title match wins.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] wrapping the failed tracker call.
    pub async fn sync(&self, spec: &IssueSpec, token: &AccessToken) -> Result<SyncOutcome, SyncError> {
        let repo = spec.repo()?;
        let issues = self
            .tracker
            .list_issues(&repo, token)
            .await
            .map_err(SyncError::List)?;

        let Some(existing) = find_by_title(&issues, &spec.title) else {
            let request = NewIssue {
                owner: repo.owner().to_owned(),
                repo: repo.repo().to_owned(),
                title: spec.title.clone(),
                body: spec.description.clone(),
            };
            let created = self
                .tracker
                .create_issue(&repo, token, &request)
                .await
                .map_err(SyncError::Create)?;
            info!(%repo, number = %created.number, "created remote issue");
            return Ok(SyncOutcome::Created(created));
        };

        if existing.body_text() == spec.description {
            debug!(%repo, number = %existing.number, "remote issue up to date");
            return Ok(SyncOutcome::Unchanged(existing.clone()));
        }

        self.tracker
            .update_issue(&repo, token, existing.number, &IssuePatch::body(spec.description.clone()))
            .await
            .map_err(|source| SyncError::Update {
                number: existing.number,
                source,
            })?;
        info!(%repo, number = %existing.number, "updated remote issue description");
        let mut updated = existing.clone();
        updated.body = Some(spec.description.clone());
        Ok(SyncOutcome::Updated(updated))
    }

    /// Closes the remote issue matching `spec.title` if it is open.
    ///
    /// A missing or already-closed issue is reported through
    /// [`CloseOutcome`] rather than as an error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] wrapping the failed tracker call.
    pub async fn close(&self, spec: &IssueSpec, token: &AccessToken) -> Result<CloseOutcome, SyncError> {
        let repo = spec.repo()?;
        let issues = self
            .tracker
            .list_issues(&repo, token)
            .await
            .map_err(SyncError::List)?;

        let Some(existing) = find_by_title(&issues, &spec.title) else {
            return Ok(CloseOutcome::NotFound);
        };
        if !existing.is_open() {
            return Ok(CloseOutcome::AlreadyClosed(existing.number));
        }

        self.tracker
            .update_issue(&repo, token, existing.number, &IssuePatch::close())
            .await
            .map_err(|source| SyncError::Update {
                number: existing.number,
                source,
            })?;
        Ok(CloseOutcome::Closed(existing.number))
    }
}
