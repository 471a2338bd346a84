//! Optional driver features and their constraints

use crate::resource::Collection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature-specific metadata, opaque to the framework
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constraints(BTreeMap<String, serde_json::Value>);

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }
}

/// Features a driver declares per collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityRegistry {
    features: BTreeMap<Collection, BTreeMap<String, Constraints>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `feature` on `collection`; re-declaring replaces its constraints
    pub fn declare_feature(
        &mut self,
        collection: Collection,
        feature: impl Into<String>,
        constraints: Constraints,
    ) {
        let feature = feature.into();
        tracing::debug!("Declared feature {}:{}", collection, feature);
        self.features
            .entry(collection)
            .or_default()
            .insert(feature, constraints);
    }

    pub fn has_feature(&self, collection: Collection, feature: &str) -> bool {
        self.features
            .get(&collection)
            .is_some_and(|f| f.contains_key(feature))
    }

    /// Constraints of a declared feature, empty when undeclared
    pub fn constraints_for(&self, collection: Collection, feature: &str) -> Constraints {
        self.features
            .get(&collection)
            .and_then(|f| f.get(feature))
            .cloned()
            .unwrap_or_default()
    }

    /// Feature names declared on `collection`, sorted
    pub fn features(&self, collection: Collection) -> Vec<&str> {
        self.features
            .get(&collection)
            .map(|f| f.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Collections with at least one declared feature
    pub fn collections(&self) -> impl Iterator<Item = Collection> + '_ {
        self.features.keys().copied()
    }
}
