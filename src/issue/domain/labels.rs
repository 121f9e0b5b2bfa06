//! Derived label index used to find resources that drive the same remote
//! issue.

use super::{IssueDomainError, IssueSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label keys under which the derived repository and title are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelKeys {
    /// Key holding `<owner>.<repo>`.
    pub repo: String,
    /// Key holding the issue title.
    pub title: String,
}

impl LabelKeys {
    /// Creates label keys.
    #[must_use]
    pub fn new(repo: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            title: title.into(),
        }
    }

    /// Returns whether both derived labels carry a non-empty value.
    #[must_use]
    pub fn present_on(&self, labels: &BTreeMap<String, String>) -> bool {
        let non_empty = |key: &str| labels.get(key).is_some_and(|value| !value.is_empty());
        non_empty(&self.repo) && non_empty(&self.title)
    }
}

impl Default for LabelKeys {
    fn default() -> Self {
        Self::new("issues.operator.io/repo", "issues.operator.io/title")
    }
}

/// Canonical label values derived from an issue spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalLabels {
    repo: String,
    title: String,
}

impl CanonicalLabels {
    /// Derives the canonical labels for a spec.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidRepoUrl`] when the spec URL does
    /// not name an owner and repository.
    pub fn from_spec(spec: &IssueSpec) -> Result<Self, IssueDomainError> {
        Ok(Self {
            repo: spec.repo()?.label_value(),
            title: spec.title.clone(),
        })
    }

    /// Returns the `<owner>.<repo>` label value.
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Returns the title label value.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns whether both labels already hold the canonical values.
    #[must_use]
    pub fn is_applied(&self, labels: &BTreeMap<String, String>, keys: &LabelKeys) -> bool {
        labels.get(&keys.repo) == Some(&self.repo) && labels.get(&keys.title) == Some(&self.title)
    }

    /// Overwrites both labels with the canonical values.
    pub fn apply(&self, labels: &mut BTreeMap<String, String>, keys: &LabelKeys) {
        labels.insert(keys.repo.clone(), self.repo.clone());
        labels.insert(keys.title.clone(), self.title.clone());
    }

    /// Returns a selector matching every resource carrying both labels.
    #[must_use]
    pub fn selector(&self, keys: &LabelKeys) -> LabelSelector {
        LabelSelector::new()
            .with(keys.repo.clone(), self.repo.clone())
            .with(keys.title.clone(), self.title.clone())
    }
}

/// Equality-based label selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    /// Creates a selector that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required `key=value` pair.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.match_labels.insert(key.into(), value.into());
        self
    }

    /// Returns the required label pairs.
    #[must_use]
    pub const fn match_labels(&self) -> &BTreeMap<String, String> {
        &self.match_labels
    }

    /// Returns whether the labels satisfy every required pair.
    #[must_use]
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .match_labels
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        write!(f, "{}", rendered.join(","))
    }
}
