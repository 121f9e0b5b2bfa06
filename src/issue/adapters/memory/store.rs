//! In-memory resource and secret store.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::issue::{
    domain::{IssueResource, LabelSelector, ObjectKey, Secret},
    ports::{IssueResourceStore, SecretStore, StoreError, StoreResult},
};

/// Thread-safe in-memory store holding issue resources and secrets.
///
/// Models the store semantics the reconciler depends on: version-checked
/// writes, soft deletion gated by finalizers, and garbage collection of
/// secrets owned by a removed resource.
#[derive(Clone)]
pub struct InMemoryClusterStore {
    state: Arc<RwLock<ClusterState>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for InMemoryClusterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryClusterStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryClusterStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

#[derive(Debug, Default)]
struct ClusterState {
    resources: BTreeMap<ObjectKey, IssueResource>,
    secrets: BTreeMap<ObjectKey, Secret>,
    update_failure: Option<StoreError>,
    status_failure: Option<StoreError>,
}

fn lock_error(err: impl ToString) -> StoreError {
    StoreError::persistence(std::io::Error::other(err.to_string()))
}

impl InMemoryClusterStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that stamps deletion timestamps from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::default(),
            clock,
        }
    }

    /// Makes every metadata update fail with `error` until cleared with `None`.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn fail_updates_with(&self, error: Option<StoreError>) -> StoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.update_failure = error;
        Ok(())
    }

    /// Makes every status update fail with `error` until cleared with `None`.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn fail_status_updates_with(&self, error: Option<StoreError>) -> StoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.status_failure = error;
        Ok(())
    }

    /// Inserts or replaces a secret, as a user editing it would.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn put_secret(&self, secret: Secret) -> StoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.secrets.insert(secret.key(), secret);
        Ok(())
    }

    /// Returns the number of stored secrets.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn secret_count(&self) -> StoreResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.secrets.len())
    }
}

fn check_version(stored: &IssueResource, incoming: &IssueResource) -> StoreResult<()> {
    if stored.metadata.resource_version != incoming.metadata.resource_version {
        return Err(StoreError::Conflict {
            key: incoming.key(),
            expected: incoming.metadata.resource_version,
            actual: stored.metadata.resource_version,
        });
    }
    Ok(())
}

fn remove_resource(state: &mut ClusterState, key: &ObjectKey, owner_uid: Uuid) {
    state.resources.remove(key);
    state.secrets.retain(|_, secret| {
        secret
            .owner
            .as_ref()
            .is_none_or(|owner| owner.uid != owner_uid)
    });
}

#[async_trait]
impl IssueResourceStore for InMemoryClusterStore {
    async fn get(&self, key: &ObjectKey) -> StoreResult<Option<IssueResource>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.resources.get(key).cloned())
    }

    async fn list(&self, selector: &LabelSelector) -> StoreResult<Vec<IssueResource>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .resources
            .values()
            .filter(|resource| selector.matches(&resource.metadata.labels))
            .cloned()
            .collect())
    }

    async fn create(&self, resource: &IssueResource) -> StoreResult<IssueResource> {
        let mut state = self.state.write().map_err(lock_error)?;
        let key = resource.key();
        if state.resources.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        let mut stored = resource.clone();
        stored.metadata.resource_version = 1;
        stored.metadata.deletion_timestamp = None;
        state.resources.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(&self, resource: &IssueResource) -> StoreResult<IssueResource> {
        let mut state = self.state.write().map_err(lock_error)?;
        if let Some(err) = state.update_failure.clone() {
            return Err(err);
        }
        let key = resource.key();
        let stored = state
            .resources
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        check_version(stored, resource)?;

        let mut next = stored.clone();
        next.metadata.labels = resource.metadata.labels.clone();
        next.metadata.finalizers = resource.metadata.finalizers.clone();
        next.metadata.resource_version += 1;
        next.spec = resource.spec.clone();

        if next.is_terminating() && next.metadata.finalizers.is_empty() {
            remove_resource(&mut state, &key, next.metadata.uid);
            return Ok(next);
        }
        state.resources.insert(key, next.clone());
        Ok(next)
    }

    async fn update_status(&self, resource: &IssueResource) -> StoreResult<IssueResource> {
        let mut state = self.state.write().map_err(lock_error)?;
        if let Some(err) = state.status_failure.clone() {
            return Err(err);
        }
        let key = resource.key();
        let stored = state
            .resources
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        check_version(stored, resource)?;

        let mut next = stored.clone();
        next.status = resource.status.clone();
        next.metadata.resource_version += 1;
        state.resources.insert(key, next.clone());
        Ok(next)
    }

    async fn delete(&self, key: &ObjectKey) -> StoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .resources
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        if stored.metadata.finalizers.is_empty() {
            let uid = stored.metadata.uid;
            remove_resource(&mut state, key, uid);
            return Ok(());
        }
        if stored.metadata.deletion_timestamp.is_none() {
            stored.metadata.deletion_timestamp = Some(self.clock.utc());
            stored.metadata.resource_version += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for InMemoryClusterStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> StoreResult<Option<Secret>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.secrets.get(&ObjectKey::new(namespace, name)).cloned())
    }

    async fn create_secret(&self, secret: &Secret) -> StoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let key = secret.key();
        if state.secrets.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        state.secrets.insert(key, secret.clone());
        Ok(())
    }
}
