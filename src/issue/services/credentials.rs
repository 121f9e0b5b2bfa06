//! Per-resource credential secret bootstrap.

use crate::issue::{
    domain::{AccessToken, IssueResource, ObjectKey, PLACEHOLDER_TOKEN, Secret},
    ports::{SecretStore, StoreError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Whether the credential secret had to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretProvisioning {
    /// The secret was absent and a placeholder was created.
    Created,
    /// The secret already existed.
    Existing,
}

/// Errors raised while bootstrapping or reading credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Looking the secret up failed for a reason other than absence.
    #[error("could not look up credential secret {key}: {source}")]
    Lookup {
        /// Secret key.
        key: ObjectKey,
        /// Store failure.
        #[source]
        source: StoreError,
    },

    /// Creating the placeholder secret failed.
    #[error("could not create credential secret {key}: {source}")]
    Create {
        /// Secret key.
        key: ObjectKey,
        /// Store failure.
        #[source]
        source: StoreError,
    },

    /// The secret disappeared between bootstrap and read.
    #[error("credential secret {0} does not exist")]
    SecretMissing(ObjectKey),

    /// The secret has no usable token entry.
    #[error("credential secret {key} has no value under '{token_key}'")]
    MissingToken {
        /// Secret key.
        key: ObjectKey,
        /// Expected entry name.
        token_key: String,
    },
}

impl CredentialError {
    /// Returns the underlying store error, if any.
    #[must_use]
    pub const fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Lookup { source, .. } | Self::Create { source, .. } => Some(source),
            Self::SecretMissing(_) | Self::MissingToken { .. } => None,
        }
    }
}

/// Ensures each resource has a credential secret and reads its token.
///
/// The token is returned to the caller and threaded through the tracker
/// calls of one reconciliation; nothing is cached process-wide.
pub struct CredentialBootstrap<K: SecretStore> {
    secrets: Arc<K>,
    name_suffix: String,
    token_key: String,
}

impl<K: SecretStore> CredentialBootstrap<K> {
    /// Creates the bootstrap service.
    #[must_use]
    pub fn new(secrets: Arc<K>, name_suffix: impl Into<String>, token_key: impl Into<String>) -> Self {
        Self {
            secrets,
            name_suffix: name_suffix.into(),
            token_key: token_key.into(),
        }
    }

    /// Returns the secret key derived from the resource identity.
    #[must_use]
    pub fn secret_key(&self, resource: &IssueResource) -> ObjectKey {
        ObjectKey::new(
            resource.metadata.namespace.clone(),
            format!("{}-{}", resource.metadata.name, self.name_suffix),
        )
    }

    /// Creates the credential secret with a placeholder token when absent.
    ///
    /// The secret is owned by `resource` so the store removes it together
    /// with the resource. A concurrent creation is reported as existing.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Lookup`] or [`CredentialError::Create`]
    /// carrying the store failure.
    pub async fn ensure_secret(
        &self,
        resource: &IssueResource,
    ) -> Result<SecretProvisioning, CredentialError> {
        let key = self.secret_key(resource);
        let existing = self
            .secrets
            .get_secret(&key.namespace, &key.name)
            .await
            .map_err(|source| CredentialError::Lookup {
                key: key.clone(),
                source,
            })?;
        if existing.is_some() {
            return Ok(SecretProvisioning::Existing);
        }

        let secret = Secret::new(key.namespace.clone(), key.name.clone())
            .with_entry(self.token_key.clone(), PLACEHOLDER_TOKEN)
            .owned_by(resource.owner_reference());
        match self.secrets.create_secret(&secret).await {
            Ok(()) => {
                info!(secret = %key, "created placeholder credential secret");
                Ok(SecretProvisioning::Created)
            }
            Err(StoreError::AlreadyExists(_)) => Ok(SecretProvisioning::Existing),
            Err(source) => Err(CredentialError::Create { key, source }),
        }
    }

    /// Reads the access token from the resource's credential secret.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::SecretMissing`] when the secret is absent,
    /// [`CredentialError::MissingToken`] when it holds no non-empty token, or
    /// [`CredentialError::Lookup`] on store failure.
    pub async fn load_token(&self, resource: &IssueResource) -> Result<AccessToken, CredentialError> {
        let key = self.secret_key(resource);
        let secret = self
            .secrets
            .get_secret(&key.namespace, &key.name)
            .await
            .map_err(|source| CredentialError::Lookup {
                key: key.clone(),
                source,
            })?
            .ok_or_else(|| CredentialError::SecretMissing(key.clone()))?;

        match secret.value(&self.token_key) {
            Some(value) if !value.trim().is_empty() => Ok(AccessToken::new(value.trim())),
            _ => Err(CredentialError::MissingToken {
                key,
                token_key: self.token_key.clone(),
            }),
        }
    }
}
