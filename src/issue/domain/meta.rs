//! Object identity and metadata shared by stored resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Namespaced identity of a stored object, as delivered by reconcile triggers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    /// Namespace holding the object.
    pub namespace: String,
    /// Object name, unique within the namespace.
    pub name: String,
}

impl ObjectKey {
    /// Creates an object key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Reference from a dependent object to the object that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    /// Kind of the owning object.
    pub kind: String,
    /// Name of the owning object.
    pub name: String,
    /// Unique identifier of the owning object.
    pub uid: Uuid,
    /// Whether the owner is the managing controller.
    pub controller: bool,
}

/// Standard object metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name.
    pub name: String,
    /// Object namespace.
    pub namespace: String,
    /// Unique identifier assigned at creation.
    pub uid: Uuid,
    /// Version used for optimistic-concurrency checks.
    #[serde(default)]
    pub resource_version: u64,
    /// Object labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Finalizer tokens blocking final removal.
    #[serde(default)]
    pub finalizers: Vec<String>,
    /// Set once deletion has been requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    /// Creates metadata for a new object with a fresh identifier.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: Uuid::new_v4(),
            resource_version: 0,
            labels: BTreeMap::new(),
            finalizers: Vec::new(),
            deletion_timestamp: None,
        }
    }

    /// Returns the namespaced key of the object.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }
}
