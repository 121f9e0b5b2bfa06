//! Store port for credential secrets.

use super::StoreResult;
use crate::issue::domain::Secret;
use async_trait::async_trait;

/// Namespaced secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Loads a secret. Returns `None` when it does not exist.
    async fn get_secret(&self, namespace: &str, name: &str) -> StoreResult<Option<Secret>>;

    /// Stores a new secret.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::AlreadyExists`] when the name is taken.
    async fn create_secret(&self, secret: &Secret) -> StoreResult<()>;
}
