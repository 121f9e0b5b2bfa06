//! GitHub REST adapter for the issue tracker port.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use std::time::Duration;
use tracing::debug;

use crate::config::TrackerSettings;
use crate::issue::{
    domain::{AccessToken, IssueNumber, IssuePatch, NewIssue, RemoteIssue, RepoCoordinates},
    ports::{IssueTracker, TrackerError, TrackerResult},
};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const LIST_PAGE_SIZE: &str = "100";

/// Issue tracker backed by the GitHub REST API.
///
/// The client is shared across reconciliations; the access token is passed
/// per call and never stored.
#[derive(Debug, Clone)]
pub struct GithubIssueTracker {
    client: Client,
    base_url: String,
}

impl GithubIssueTracker {
    /// Creates a tracker client.
    ///
    /// `base_url` is the API root, e.g. `https://api.github.com`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> TrackerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(TrackerError::transport)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Creates a tracker client from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn from_settings(settings: &TrackerSettings) -> TrackerResult<Self> {
        Self::new(settings.base_url.clone(), &settings.user_agent, settings.timeout())
    }

    fn issues_url(&self, repo: &RepoCoordinates) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.base_url,
            repo.owner(),
            repo.repo()
        )
    }

    fn request(&self, method: Method, url: String, token: &AccessToken) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(token.expose())
            .header(header::ACCEPT, GITHUB_MEDIA_TYPE)
    }
}

async fn send(builder: RequestBuilder) -> TrackerResult<Response> {
    let response = builder.send().await.map_err(TrackerError::transport)?;
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(TrackerError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TrackerError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

#[async_trait]
impl IssueTracker for GithubIssueTracker {
    async fn list_issues(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
    ) -> TrackerResult<Vec<RemoteIssue>> {
        debug!(%repo, "listing remote issues");
        let request = self
            .request(Method::GET, self.issues_url(repo), token)
            .query(&[("per_page", LIST_PAGE_SIZE)]);
        let response = send(request).await?;
        response
            .json::<Vec<RemoteIssue>>()
            .await
            .map_err(|err| TrackerError::Decode(err.to_string()))
    }

    async fn create_issue(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
        issue: &NewIssue,
    ) -> TrackerResult<RemoteIssue> {
        debug!(%repo, title = %issue.title, "creating remote issue");
        let response = send(
            self.request(Method::POST, self.issues_url(repo), token)
                .json(issue),
        )
        .await?;
        response
            .json::<RemoteIssue>()
            .await
            .map_err(|err| TrackerError::Decode(err.to_string()))
    }

    async fn update_issue(
        &self,
        repo: &RepoCoordinates,
        token: &AccessToken,
        number: IssueNumber,
        patch: &IssuePatch,
    ) -> TrackerResult<()> {
        debug!(%repo, %number, "updating remote issue");
        let url = format!("{}/{number}", self.issues_url(repo));
        send(self.request(Method::POST, url, token).json(patch)).await?;
        Ok(())
    }
}
