//! Managed resources returned by drivers

use crate::filter::Filterable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource collections a driver may serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Instances,
    Images,
    Realms,
    StorageVolumes,
    StorageSnapshots,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Instances,
        Collection::Images,
        Collection::Realms,
        Collection::StorageVolumes,
        Collection::StorageSnapshots,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Instances => "instances",
            Collection::Images => "images",
            Collection::Realms => "realms",
            Collection::StorageVolumes => "storage_volumes",
            Collection::StorageSnapshots => "storage_snapshots",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "instances" => Ok(Collection::Instances),
            "images" => Ok(Collection::Images),
            "realms" => Ok(Collection::Realms),
            "storage_volumes" => Ok(Collection::StorageVolumes),
            "storage_snapshots" => Ok(Collection::StorageSnapshots),
            _ => Err(UnknownCollection(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown collection name.
#[derive(Debug, Clone)]
pub struct UnknownCollection(pub String);

impl std::fmt::Display for UnknownCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown collection '{}', valid values: instances, images, realms, storage_volumes, storage_snapshots",
            self.0
        )
    }
}

impl std::error::Error for UnknownCollection {}

/// A managed entity reported by a backend
///
/// Drivers fill in identity, the observed state and attributes. The
/// `actions` list is owned by the dispatcher, which recomputes it from the
/// collection's lifecycle on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Provider-specific resource ID
    pub id: String,

    /// Collection this resource belongs to
    pub collection: Collection,

    /// Owning user, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    /// Current lifecycle state as reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Actions legal from the current state
    #[serde(default)]
    pub actions: Vec<String>,

    /// When the backend created the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Resource-specific attributes (name, realm_id, addresses, ...)
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Resource {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection,
            owner_id: None,
            state: None,
            actions: Vec::new(),
            created_at: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner_id = Some(owner.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Whether `action` is currently legal for this resource
    pub fn allows(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

impl Filterable for Resource {
    fn attribute(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "id" => Some(serde_json::Value::String(self.id.clone())),
            "collection" => Some(serde_json::Value::String(self.collection.to_string())),
            "owner_id" => self.owner_id.clone().map(serde_json::Value::String),
            "state" => self.state.clone().map(serde_json::Value::String),
            _ => self.attributes.get(name).cloned(),
        }
    }
}
