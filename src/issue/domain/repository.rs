//! Repository coordinates derived from repository URLs.

use super::IssueDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

const GITHUB_URL_PREFIX: &str = "https://github.com/";

/// Owner and repository name of a tracker repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCoordinates {
    owner: String,
    repo: String,
}

impl RepoCoordinates {
    /// Creates coordinates from already separated components.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidRepoUrl`] if either component is
    /// empty or contains a slash.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self, IssueDomainError> {
        let owner_value = owner.into();
        let repo_value = repo.into();
        let valid = |segment: &str| !segment.is_empty() && !segment.contains('/');
        if !valid(&owner_value) || !valid(&repo_value) {
            return Err(IssueDomainError::InvalidRepoUrl(format!(
                "{owner_value}/{repo_value}"
            )));
        }
        Ok(Self {
            owner: owner_value,
            repo: repo_value,
        })
    }

    /// Extracts owner and repository from the last two path segments of a
    /// repository URL.
    ///
    /// Anything before the final two segments is ignored and a trailing slash
    /// is tolerated, so `https://github.com/acme/widgets/` yields
    /// `acme`/`widgets`.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidRepoUrl`] when the URL has fewer
    /// than two non-empty trailing segments.
    pub fn from_repo_url(url: &str) -> Result<Self, IssueDomainError> {
        let trimmed = url.trim().trim_end_matches('/');
        let mut segments = trimmed.rsplit('/');
        let repo = segments.next().unwrap_or_default();
        let owner = segments.next().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() {
            return Err(IssueDomainError::InvalidRepoUrl(url.to_owned()));
        }
        Ok(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        })
    }

    /// Parses a repository URL under the admission rule
    /// `^https://github\.com/[\w-]+/[\w-]+$`.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidRepoUrl`] for any other shape.
    pub fn parse_strict(url: &str) -> Result<Self, IssueDomainError> {
        let invalid = || IssueDomainError::InvalidRepoUrl(url.to_owned());
        let rest = url.strip_prefix(GITHUB_URL_PREFIX).ok_or_else(invalid)?;
        let mut segments = rest.split('/');
        let owner = segments.next().unwrap_or_default();
        let repo = segments.next().unwrap_or_default();
        if segments.next().is_some() || !is_word_segment(owner) || !is_word_segment(repo) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        })
    }

    /// Returns the repository owner.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Returns the `<owner>.<repo>` form used as a label value.
    #[must_use]
    pub fn label_value(&self) -> String {
        format!("{}.{}", self.owner, self.repo)
    }
}

fn is_word_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
