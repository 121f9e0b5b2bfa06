//! Deletion finalizer maintenance.

use crate::issue::{
    domain::IssueResource,
    ports::{IssueResourceStore, StoreResult},
};
use std::sync::Arc;

/// Adds and removes the deletion finalizer token.
///
/// Both operations are idempotent and persist only when the finalizer set
/// changes. Store failures are returned as-is and the local copy is left as
/// it was before the call.
pub struct FinalizerLifecycle<R: IssueResourceStore> {
    store: Arc<R>,
    token: String,
}

impl<R: IssueResourceStore> FinalizerLifecycle<R> {
    /// Creates the service for a finalizer token.
    #[must_use]
    pub fn new(store: Arc<R>, token: impl Into<String>) -> Self {
        Self {
            store,
            token: token.into(),
        }
    }

    /// Returns the finalizer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Adds the token if missing. Returns `true` when a write happened.
    ///
    /// # Errors
    ///
    /// Returns the store error when the update fails.
    pub async fn ensure_present(&self, resource: &mut IssueResource) -> StoreResult<bool> {
        if !resource.add_finalizer(&self.token) {
            return Ok(false);
        }
        match self.store.update(resource).await {
            Ok(stored) => {
                *resource = stored;
                Ok(true)
            }
            Err(err) => {
                resource.remove_finalizer(&self.token);
                Err(err)
            }
        }
    }

    /// Removes the token if present. Returns `true` when a write happened.
    ///
    /// # Errors
    ///
    /// Returns the store error when the update fails.
    pub async fn remove(&self, resource: &mut IssueResource) -> StoreResult<bool> {
        if !resource.remove_finalizer(&self.token) {
            return Ok(false);
        }
        match self.store.update(resource).await {
            Ok(stored) => {
                *resource = stored;
                Ok(true)
            }
            Err(err) => {
                resource.add_finalizer(&self.token);
                Err(err)
            }
        }
    }
}
