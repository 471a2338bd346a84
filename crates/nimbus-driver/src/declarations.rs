//! Everything a driver declares about itself
//!
//! [`DeclarationsBuilder`] is the registration surface drivers use once, at
//! construction time. [`Declarations`] has no mutating API, so once built it
//! can be shared across concurrent requests without locking.

use crate::capability::{CapabilityRegistry, Constraints};
use crate::error::RegistrationError;
use crate::lifecycle::Lifecycle;
use crate::profile::{HardwareProfile, ProfilePredicate, ProfileRegistry};
use crate::resource::Collection;
use crate::translate::ErrorTranslator;
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, RegistrationError>;

/// Immutable driver configuration
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    profiles: ProfileRegistry,
    capabilities: CapabilityRegistry,
    lifecycles: BTreeMap<Collection, Lifecycle>,
    errors: ErrorTranslator,
}

impl Declarations {
    pub fn builder() -> DeclarationsBuilder {
        DeclarationsBuilder::default()
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn errors(&self) -> &ErrorTranslator {
        &self.errors
    }

    pub fn lifecycle(&self, collection: Collection) -> Option<&Lifecycle> {
        self.lifecycles.get(&collection)
    }

    pub fn hardware_profiles(&self, predicate: &ProfilePredicate) -> Vec<&HardwareProfile> {
        self.profiles.filter(predicate)
    }

    pub fn has_feature(&self, collection: Collection, feature: &str) -> bool {
        self.capabilities.has_feature(collection, feature)
    }

    pub fn constraints_for(&self, collection: Collection, feature: &str) -> Constraints {
        self.capabilities.constraints_for(collection, feature)
    }
}

/// Registration surface for a driver's declarations
#[derive(Debug, Default)]
pub struct DeclarationsBuilder {
    inner: Declarations,
}

impl DeclarationsBuilder {
    pub fn hardware_profile(mut self, profile: HardwareProfile) -> Result<Self> {
        self.inner.profiles.define(profile)?;
        Ok(self)
    }

    pub fn feature(self, collection: Collection, feature: impl Into<String>) -> Self {
        self.feature_with(collection, feature, Constraints::new())
    }

    pub fn feature_with(
        mut self,
        collection: Collection,
        feature: impl Into<String>,
        constraints: Constraints,
    ) -> Self {
        self.inner
            .capabilities
            .declare_feature(collection, feature, constraints);
        self
    }

    pub fn lifecycle(mut self, collection: Collection, lifecycle: Lifecycle) -> Result<Self> {
        if self.inner.lifecycles.contains_key(&collection) {
            return Err(RegistrationError::DuplicateLifecycle(collection.to_string()));
        }
        self.inner.lifecycles.insert(collection, lifecycle);
        Ok(self)
    }

    pub fn error_pattern(mut self, pattern: &str, status: u16) -> Result<Self> {
        self.inner.errors.register_pattern(pattern, status)?;
        Ok(self)
    }

    pub fn error_substring(mut self, text: &str, status: u16) -> Result<Self> {
        self.inner.errors.register_substring(text, status)?;
        Ok(self)
    }

    pub fn build(self) -> Declarations {
        self.inner
    }
}
