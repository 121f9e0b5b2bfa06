//! Store port for issue resources.

use crate::issue::domain::{IssueResource, LabelSelector, ObjectKey};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Strongly consistent store for issue resources.
///
/// Writes are guarded by `resource_version`: a write carrying a version
/// other than the stored one fails with [`StoreError::Conflict`]. Successful
/// writes return the stored object with its new version.
#[async_trait]
pub trait IssueResourceStore: Send + Sync {
    /// Loads a resource. Returns `None` when it does not exist.
    async fn get(&self, key: &ObjectKey) -> StoreResult<Option<IssueResource>>;

    /// Lists resources in all namespaces whose labels match the selector.
    async fn list(&self, selector: &LabelSelector) -> StoreResult<Vec<IssueResource>>;

    /// Stores a new resource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when the key is taken.
    async fn create(&self, resource: &IssueResource) -> StoreResult<IssueResource>;

    /// Persists metadata and spec. Status is left as stored.
    ///
    /// A terminating resource whose finalizer set becomes empty is removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] or [`StoreError::Conflict`].
    async fn update(&self, resource: &IssueResource) -> StoreResult<IssueResource>;

    /// Persists the status subresource. Metadata and spec are left as stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] or [`StoreError::Conflict`].
    async fn update_status(&self, resource: &IssueResource) -> StoreResult<IssueResource>;

    /// Requests deletion. Resources holding finalizers are only marked with a
    /// deletion timestamp; others are removed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the resource does not exist.
    async fn delete(&self, key: &ObjectKey) -> StoreResult<()>;
}

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("object not found: {0}")]
    NotFound(ObjectKey),

    /// An object with the same key already exists.
    #[error("object already exists: {0}")]
    AlreadyExists(ObjectKey),

    /// The write was based on a stale version.
    #[error("version conflict on {key}: expected {expected}, stored {actual}")]
    Conflict {
        /// Object key.
        key: ObjectKey,
        /// Version carried by the write.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether the error is a stale-write conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
