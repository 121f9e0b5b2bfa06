//! Credential secrets and access tokens.

use super::{ObjectKey, OwnerReference};
use std::collections::BTreeMap;
use std::fmt;

/// Value written into a freshly created credential secret.
pub const PLACEHOLDER_TOKEN: &str = "{Insert your github access token here}";

/// Namespaced key/value secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    /// Secret name.
    pub name: String,
    /// Secret namespace.
    pub namespace: String,
    /// Owning object; the store collects the secret when the owner is removed.
    pub owner: Option<OwnerReference>,
    /// Secret entries.
    pub data: BTreeMap<String, String>,
}

impl Secret {
    /// Creates a secret without an owner.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            owner: None,
            data: BTreeMap::new(),
        }
    }

    /// Adds an entry.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Sets the owning object.
    #[must_use]
    pub fn owned_by(mut self, owner: OwnerReference) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Returns the namespaced key of the secret.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Returns an entry value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("owner", &self.owner)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Tracker access token scoped to a single reconciliation.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token for use in an authorization header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns whether the token is still the bootstrap placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_TOKEN
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
