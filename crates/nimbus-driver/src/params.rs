//! Typed creation parameters, one shape per collection

use crate::profile::{ProfileConfiguration, PropertyValue};
use crate::resource::Collection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters for creating a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum CreateParams {
    Instance(InstanceParams),
    Image(ImageParams),
    StorageVolume(VolumeParams),
    StorageSnapshot(SnapshotParams),
}

impl CreateParams {
    pub fn collection(&self) -> Collection {
        match self {
            CreateParams::Instance(_) => Collection::Instances,
            CreateParams::Image(_) => Collection::Images,
            CreateParams::StorageVolume(_) => Collection::StorageVolumes,
            CreateParams::StorageSnapshot(_) => Collection::StorageSnapshots,
        }
    }
}

/// Hardware profile chosen for a new instance, with property overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSelection {
    pub name: String,
    #[serde(default)]
    pub overrides: BTreeMap<String, PropertyValue>,
}

impl ProfileSelection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.overrides.insert(property.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceParams {
    pub image_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<ProfileSelection>,
    /// Requires the `user_data` feature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    /// Requires the `user_name` feature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl InstanceParams {
    pub fn new(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            ..Default::default()
        }
    }

    pub fn with_realm(mut self, realm_id: impl Into<String>) -> Self {
        self.realm_id = Some(realm_id.into());
        self
    }

    pub fn with_profile(mut self, selection: ProfileSelection) -> Self {
        self.hardware_profile = Some(selection);
        self
    }

    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageParams {
    pub instance_id: String,
    /// Requires the images `user_name` feature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeParams {
    /// Capacity in GB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotParams {
    pub volume_id: String,
}

/// What a backend receives once the dispatcher has validated a create call
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub params: CreateParams,
    /// Resolved hardware configuration for instances
    pub profile: Option<ProfileConfiguration>,
}
