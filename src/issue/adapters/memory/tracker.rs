//! In-memory issue tracker for reconcile tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::issue::{
    domain::{
        AccessToken, IssueNumber, IssuePatch, NewIssue, RemoteIssue, RemoteIssueState,
        RepoCoordinates,
    },
    ports::{IssueTracker, TrackerError, TrackerResult},
};

/// Calls observed by an [`InMemoryIssueTracker`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerCalls {
    /// Number of list calls.
    pub list: usize,
    /// Number of create calls.
    pub create: usize,
    /// Number of update calls.
    pub update: usize,
    /// Patches applied, in call order.
    pub patches: Vec<(IssueNumber, IssuePatch)>,
}

/// Scriptable in-memory issue tracker.
///
/// Issues are kept per repository in creation order. When an accepted token
/// is configured, calls carrying any other token fail with
/// [`TrackerError::Unauthorized`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryIssueTracker {
    state: Arc<RwLock<TrackerState>>,
}

#[derive(Debug, Default)]
struct TrackerState {
    issues: HashMap<RepoCoordinates, Vec<RemoteIssue>>,
    accepted_token: Option<String>,
    last_number: u64,
    calls: TrackerCalls,
    list_failure: Option<TrackerError>,
    create_failure: Option<TrackerError>,
    update_failure: Option<TrackerError>,
}

fn lock_error(err: impl ToString) -> TrackerError {
    TrackerError::transport(std::io::Error::other(err.to_string()))
}

impl TrackerState {
    fn authorize(&self, token: &AccessToken) -> TrackerResult<()> {
        match &self.accepted_token {
            Some(accepted) if accepted != token.expose() => Err(TrackerError::Unauthorized),
            _ => Ok(()),
        }
    }

    fn next_number(&mut self) -> TrackerResult<IssueNumber> {
        self.last_number += 1;
        IssueNumber::new(self.last_number).map_err(|err| TrackerError::Decode(err.to_string()))
    }
}

impl InMemoryIssueTracker {
    /// Creates an empty tracker that accepts any token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the tracker to a single accepted token.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn accept_only(&self, token: impl Into<String>) -> TrackerResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.accepted_token = Some(token.into());
        Ok(())
    }

    /// Adds an issue directly, without counting a call.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn seed_issue(
        &self,
        repo: &RepoCoordinates,
        title: impl Into<String>,
        body: impl Into<String>,
        issue_state: RemoteIssueState,
    ) -> TrackerResult<RemoteIssue> {
        let mut state = self.state.write().map_err(lock_error)?;
        let issue = RemoteIssue {
            number: state.next_number()?,
            title: title.into(),
            body: Some(body.into()),
            state: issue_state,
        };
        state
            .issues
            .entry(repo.clone())
            .or_default()
            .push(issue.clone());
        Ok(issue)
    }

    /// Returns the issues of a repository.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn issues(&self, repo: &RepoCoordinates) -> TrackerResult<Vec<RemoteIssue>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.issues.get(repo).cloned().unwrap_or_default())
    }

    /// Returns the calls observed so far.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn calls(&self) -> TrackerResult<TrackerCalls> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.calls.clone())
    }

    /// Makes the next list call fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn fail_next_list(&self, error: TrackerError) -> TrackerResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.list_failure = Some(error);
        Ok(())
    }

    /// Makes the next create call fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn fail_next_create(&self, error: TrackerError) -> TrackerResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.create_failure = Some(error);
        Ok(())
    }

    /// Makes the next update call fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn fail_next_update(&self, error: TrackerError) -> TrackerResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.update_failure = Some(error);
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for InMemoryIssueTracker {
    async fn list_issues(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
    ) -> TrackerResult<Vec<RemoteIssue>> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.calls.list += 1;
        state.authorize(token)?;
        if let Some(err) = state.list_failure.take() {
            return Err(err);
        }
        Ok(state.issues.get(repo).cloned().unwrap_or_default())
    }

    async fn create_issue(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
        issue: &NewIssue,
    ) -> TrackerResult<RemoteIssue> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.calls.create += 1;
        state.authorize(token)?;
        if let Some(err) = state.create_failure.take() {
            return Err(err);
        }
        let created = RemoteIssue {
            number: state.next_number()?,
            title: issue.title.clone(),
            body: Some(issue.body.clone()),
            state: RemoteIssueState::Open,
        };
        state
            .issues
            .entry(repo.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update_issue(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
        number: IssueNumber,
        patch: &IssuePatch,
    ) -> TrackerResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.calls.update += 1;
        state.calls.patches.push((number, patch.clone()));
        state.authorize(token)?;
        if let Some(err) = state.update_failure.take() {
            return Err(err);
        }
        let issue = state
            .issues
            .get_mut(repo)
            .and_then(|issues| issues.iter_mut().find(|issue| issue.number == number))
            .ok_or_else(|| TrackerError::Http {
                status: 404,
                body: format!("issue {repo}#{number} not found"),
            })?;
        if let Some(body) = &patch.body {
            issue.body = Some(body.clone());
        }
        if let Some(issue_state) = patch.state {
            issue.state = issue_state;
        }
        Ok(())
    }
}
