//! Canonical label index maintenance.

use crate::issue::{
    domain::{CanonicalLabels, IssueDomainError, IssueResource, LabelKeys},
    ports::{IssueResourceStore, StoreError},
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while maintaining canonical labels.
#[derive(Debug, Error)]
pub enum LabelIndexError {
    /// The spec cannot produce canonical label values.
    #[error(transparent)]
    Domain(#[from] IssueDomainError),

    /// Persisting the labels failed.
    #[error("could not persist canonical labels: {0}")]
    Store(#[from] StoreError),
}

impl LabelIndexError {
    /// Returns `true` when the write lost an optimistic-concurrency race.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_conflict())
    }
}

/// Keeps the repository and title labels in sync with the spec so sibling
/// resources can be found with a label selector.
pub struct LabelIndexMaintainer<R: IssueResourceStore> {
    store: Arc<R>,
    keys: LabelKeys,
}

impl<R: IssueResourceStore> LabelIndexMaintainer<R> {
    /// Creates the maintainer for the given label keys.
    #[must_use]
    pub const fn new(store: Arc<R>, keys: LabelKeys) -> Self {
        Self { store, keys }
    }

    /// Applies canonical labels, persisting only when they differ from what
    /// is stored. Returns `true` when a write happened.
    ///
    /// # Errors
    ///
    /// Returns [`LabelIndexError::Domain`] for an unparseable repository URL
    /// and [`LabelIndexError::Store`] when the update fails. On failure the
    /// local labels are restored.
    pub async fn ensure_labels(&self, resource: &mut IssueResource) -> Result<bool, LabelIndexError> {
        let canonical = CanonicalLabels::from_spec(&resource.spec)?;
        if canonical.is_applied(&resource.metadata.labels, &self.keys) {
            return Ok(false);
        }

        let previous = resource.metadata.labels.clone();
        canonical.apply(&mut resource.metadata.labels, &self.keys);
        match self.store.update(resource).await {
            Ok(stored) => {
                *resource = stored;
                Ok(true)
            }
            Err(err) => {
                resource.metadata.labels = previous;
                Err(err.into())
            }
        }
    }
}
