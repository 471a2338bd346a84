//! The driver contract as seen by front ends
//!
//! [`Dispatcher`] wraps a [`Driver`] and is the only way requests reach a
//! backend. Around every hook it:
//!
//! - refuses collections the driver does not serve,
//! - validates creation parameters against declared features and profiles,
//! - checks an action is legal from the resource's current state before the
//!   backend sees it,
//! - resolves reported states and recomputes legal actions on every result,
//! - translates backend failures into [`UniformError`]s.

use crate::capability::Constraints;
use crate::declarations::Declarations;
use crate::driver::{AuthStatus, Credentials, Driver};
use crate::error::{ErrorKind, Result, UniformError};
use crate::filter::{FilterPredicate, filter_on};
use crate::lifecycle::{Lifecycle, StateInfo};
use crate::params::{CreateParams, CreateRequest};
use crate::profile::{HardwareProfile, ProfileConfiguration, ProfilePredicate};
use crate::resource::{Collection, Resource};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Front-end entry point for one driver
#[derive(Clone)]
pub struct Dispatcher {
    driver: Arc<dyn Driver>,
}

impl Dispatcher {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn declarations(&self) -> &Declarations {
        self.driver.declarations()
    }

    /// Whether the driver serves `collection` at all
    pub fn has_capability(&self, collection: Collection) -> bool {
        self.driver.collections().contains(&collection)
    }

    fn require(&self, collection: Collection) -> Result<()> {
        if self.has_capability(collection) {
            Ok(())
        } else {
            Err(UniformError::not_supported(format!(
                "driver {} does not support {}",
                self.driver.name(),
                collection
            )))
        }
    }

    pub fn hardware_profiles(&self, predicate: &ProfilePredicate) -> Vec<&HardwareProfile> {
        self.declarations().hardware_profiles(predicate)
    }

    /// States and transitions of `collection`'s lifecycle
    pub fn states(&self, collection: Collection) -> Result<Vec<StateInfo>> {
        self.require(collection)?;
        self.lifecycle(collection).map(Lifecycle::describe)
    }

    fn lifecycle(&self, collection: Collection) -> Result<&Lifecycle> {
        self.declarations().lifecycle(collection).ok_or_else(|| {
            UniformError::not_supported(format!(
                "driver {} declares no lifecycle for {}",
                self.driver.name(),
                collection
            ))
        })
    }

    pub async fn check_auth(&self, credentials: &Credentials) -> Result<AuthStatus> {
        self.declarations()
            .errors()
            .guard(self.driver.check_auth(credentials))
            .await
    }

    pub async fn list(
        &self,
        credentials: &Credentials,
        collection: Collection,
        predicate: &FilterPredicate,
    ) -> Result<Vec<Resource>> {
        self.require(collection)?;
        tracing::debug!("Listing {} on {}", collection, self.driver.name());

        let resources = self
            .declarations()
            .errors()
            .guard(self.driver.list(credentials, collection, predicate))
            .await?
            .into_iter()
            .map(|r| self.annotate(r))
            .collect::<Result<Vec<_>>>()?;

        Ok(filter_on(resources, predicate))
    }

    pub async fn get(
        &self,
        credentials: &Credentials,
        collection: Collection,
        id: &str,
    ) -> Result<Resource> {
        self.require(collection)?;
        let resource = self
            .declarations()
            .errors()
            .guard(self.driver.get(credentials, collection, id))
            .await?
            .ok_or_else(|| UniformError::not_found(collection, id))?;
        self.annotate(resource)
    }

    pub async fn create(&self, credentials: &Credentials, params: CreateParams) -> Result<Resource> {
        let collection = params.collection();
        self.require(collection)?;

        let profile = self.validate_create(&params)?;
        let request = CreateRequest { params, profile };

        tracing::info!("Creating resource in {} on {}", collection, self.driver.name());
        let resource = self
            .declarations()
            .errors()
            .guard(self.driver.create(credentials, &request))
            .await?;
        self.annotate(resource)
    }

    pub async fn destroy(
        &self,
        credentials: &Credentials,
        collection: Collection,
        id: &str,
    ) -> Result<()> {
        self.require(collection)?;
        tracing::info!("Destroying {} {} on {}", collection, id, self.driver.name());
        self.declarations()
            .errors()
            .guard(self.driver.destroy(credentials, collection, id))
            .await
    }

    /// Invoke `action` on a resource after checking it is legal right now
    pub async fn act(
        &self,
        credentials: &Credentials,
        collection: Collection,
        id: &str,
        action: &str,
    ) -> Result<Resource> {
        let lifecycle = self.lifecycle(collection)?;
        let current = self.get(credentials, collection, id).await?;
        let state = current.state.as_deref().unwrap_or(lifecycle.initial());
        lifecycle.apply(state, action)?;

        tracing::info!("Running {} on {} {} (state {})", action, collection, id, state);
        let resource = self
            .declarations()
            .errors()
            .guard(self.driver.perform(credentials, collection, id, action))
            .await?;
        self.annotate(resource)
    }

    /// Resolve the reported state and recompute legal actions
    fn annotate(&self, mut resource: Resource) -> Result<Resource> {
        let Some(lifecycle) = self.declarations().lifecycle(resource.collection) else {
            resource.actions.clear();
            return Ok(resource);
        };

        let observed = resource.state.as_deref().unwrap_or_default();
        let state = lifecycle.resolve(observed).ok_or_else(|| {
            UniformError::new(
                ErrorKind::ProviderError,
                format!(
                    "backend reported unknown state '{}' for {} {}",
                    observed, resource.collection, resource.id
                ),
            )
        })?;

        resource.actions = lifecycle
            .legal_actions(state)
            .into_iter()
            .map(str::to_string)
            .collect();
        resource.state = Some(state.to_string());
        Ok(resource)
    }

    /// Check declared features and resolve the hardware profile
    fn validate_create(&self, params: &CreateParams) -> Result<Option<ProfileConfiguration>> {
        let collection = params.collection();
        match params {
            CreateParams::Instance(instance) => {
                self.require_feature(collection, "user_data", instance.user_data.as_deref())?;
                self.require_feature(collection, "user_name", instance.user_name.as_deref())?;

                let profiles = self.declarations().profiles();
                let configuration = match &instance.hardware_profile {
                    Some(selection) => {
                        let profile = profiles.get(&selection.name).ok_or_else(|| {
                            UniformError::validation(format!(
                                "unknown hardware profile {}",
                                selection.name
                            ))
                        })?;
                        Some(profile.configure(&selection.overrides)?)
                    }
                    None => match profiles.all().first() {
                        Some(profile) => Some(profile.configure(&BTreeMap::new())?),
                        None => None,
                    },
                };
                Ok(configuration)
            }
            CreateParams::Image(image) => {
                self.require_feature(collection, "user_name", image.name.as_deref())?;
                Ok(None)
            }
            CreateParams::StorageVolume(volume) => {
                if volume.capacity.is_some_and(|c| c <= 0) {
                    return Err(UniformError::validation("capacity must be positive"));
                }
                Ok(None)
            }
            CreateParams::StorageSnapshot(_) => Ok(None),
        }
    }

    fn require_feature(
        &self,
        collection: Collection,
        feature: &str,
        value: Option<&str>,
    ) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        if !self.declarations().has_feature(collection, feature) {
            return Err(UniformError::validation(format!(
                "driver {} does not support {} for {}",
                self.driver.name(),
                feature,
                collection
            )));
        }
        check_max_length(
            &self.declarations().constraints_for(collection, feature),
            feature,
            value,
        )
    }
}

fn check_max_length(constraints: &Constraints, feature: &str, value: &str) -> Result<()> {
    match constraints.get_as::<usize>("max_length") {
        Some(max) if value.chars().count() > max => Err(UniformError::validation(format!(
            "{} is longer than {} characters",
            feature, max
        ))),
        _ => Ok(()),
    }
}
