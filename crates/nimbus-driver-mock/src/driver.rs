//! Mock driver implementation

use crate::declarations::{STORAGE_QUOTA_GB, declarations};
use crate::error::{MockError, Result};
use crate::store::{MockStore, OWNER};
use async_trait::async_trait;
use nimbus_driver::{
    AuthStatus, Collection, CreateParams, CreateRequest, Credentials, Declarations, Driver,
    FilterPredicate, Resource,
};
use serde_json::json;

pub const MOCK_USER: &str = "mockuser";
pub const MOCK_PASSWORD: &str = "mockpassword";

const COLLECTIONS: &[Collection] = &[
    Collection::Instances,
    Collection::Images,
    Collection::Realms,
    Collection::StorageVolumes,
    Collection::StorageSnapshots,
];

/// Realm used when a request names none
pub const DEFAULT_REALM: &str = "us";

/// Driver backed by an in-memory [`MockStore`]
pub struct MockDriver {
    declarations: Declarations,
    store: MockStore,
    default_realm: String,
}

impl MockDriver {
    pub fn new() -> Result<Self> {
        Self::with_store(MockStore::seeded())
    }

    pub fn with_store(store: MockStore) -> Result<Self> {
        Ok(Self {
            declarations: declarations()?,
            store,
            default_realm: DEFAULT_REALM.to_string(),
        })
    }

    /// Place new resources in `realm` unless a request names one
    pub fn with_default_realm(mut self, realm: impl Into<String>) -> Self {
        self.default_realm = realm.into();
        self
    }

    fn realm_or_default(&self, realm: Option<&str>) -> String {
        realm.unwrap_or(&self.default_realm).to_string()
    }

    pub fn store(&self) -> &MockStore {
        &self.store
    }

    /// Common preamble of every backend call
    async fn enter(&self, credentials: &Credentials) -> Result<()> {
        if let Some(message) = self.store.take_failure().await {
            return Err(MockError::Injected(message));
        }
        if credentials.user != MOCK_USER || credentials.password() != MOCK_PASSWORD {
            return Err(MockError::AuthenticationFailed(credentials.user.clone()));
        }
        Ok(())
    }

    async fn require(&self, collection: Collection, id: &str) -> Result<Resource> {
        self.store
            .get(collection, id)
            .await
            .ok_or_else(|| MockError::not_found(collection, id))
    }

    async fn create_resource(&self, request: &CreateRequest) -> Result<Resource> {
        match &request.params {
            CreateParams::Instance(params) => {
                let image = self.require(Collection::Images, &params.image_id).await?;
                let realm_id = self.realm_or_default(params.realm_id.as_deref());
                self.require(Collection::Realms, &realm_id).await?;

                let name = params
                    .user_name
                    .clone()
                    .or_else(|| params.name.clone())
                    .unwrap_or_else(|| format!("{} instance", image.id));
                let mut instance = Resource::new(Collection::Instances, "")
                    .with_owner(OWNER)
                    .with_state("PENDING")
                    .with_created_at(chrono::Utc::now())
                    .with_attribute("name", json!(name))
                    .with_attribute("image_id", json!(image.id))
                    .with_attribute("realm_id", json!(realm_id));
                if let Some(profile) = &request.profile {
                    instance.set_attribute("hardware_profile", json!(profile.profile));
                    instance.set_attribute("hardware_configuration", json!(profile.values));
                }
                if let Some(user_data) = &params.user_data {
                    instance.set_attribute("user_data", json!(user_data));
                }
                Ok(self.store.insert("inst", instance).await)
            }
            CreateParams::Image(params) => {
                let instance = self
                    .require(Collection::Instances, &params.instance_id)
                    .await?;
                let name = params
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{} image", instance.id));
                let image = Resource::new(Collection::Images, "")
                    .with_owner(OWNER)
                    .with_created_at(chrono::Utc::now())
                    .with_attribute("name", json!(name))
                    .with_attribute("architecture", json!("x86_64"))
                    .with_attribute(
                        "description",
                        json!(params.description.clone().unwrap_or_default()),
                    );
                Ok(self.store.insert("img", image).await)
            }
            CreateParams::StorageVolume(params) => {
                let capacity = params.capacity.unwrap_or(1);
                if let Some(snapshot_id) = &params.snapshot_id {
                    self.require(Collection::StorageSnapshots, snapshot_id)
                        .await?;
                }
                let mut volume = Resource::new(Collection::StorageVolumes, "")
                    .with_owner(OWNER)
                    .with_state("CREATING")
                    .with_created_at(chrono::Utc::now())
                    .with_attribute("capacity", json!(capacity))
                    .with_attribute(
                        "realm_id",
                        json!(self.realm_or_default(params.realm_id.as_deref())),
                    );
                if let Some(name) = &params.name {
                    volume.set_attribute("name", json!(name));
                }
                self.store
                    .insert_within_quota("vol", volume, capacity, STORAGE_QUOTA_GB)
                    .await
            }
            CreateParams::StorageSnapshot(params) => {
                self.require(Collection::StorageVolumes, &params.volume_id)
                    .await?;
                let snapshot = Resource::new(Collection::StorageSnapshots, "")
                    .with_owner(OWNER)
                    .with_state("COMPLETED")
                    .with_created_at(chrono::Utc::now())
                    .with_attribute("volume_id", json!(params.volume_id));
                Ok(self.store.insert("snap", snapshot).await)
            }
        }
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn display_name(&self) -> &str {
        "Mock"
    }

    fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    fn collections(&self) -> &[Collection] {
        COLLECTIONS
    }

    async fn check_auth(&self, credentials: &Credentials) -> anyhow::Result<AuthStatus> {
        match self.enter(credentials).await {
            Ok(()) => Ok(AuthStatus::ok(credentials.user.clone())),
            Err(MockError::AuthenticationFailed(user)) => Ok(AuthStatus::failed(format!(
                "Authentication failed for user {}",
                user
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(
        &self,
        credentials: &Credentials,
        collection: Collection,
        predicate: &FilterPredicate,
    ) -> anyhow::Result<Vec<Resource>> {
        self.enter(credentials).await?;
        if let Some(lifecycle) = self.declarations.lifecycle(collection) {
            self.store.tick(collection, lifecycle).await;
        }

        let mut resources = self.store.list(collection).await;
        if collection == Collection::Instances
            && self.declarations.has_feature(collection, "realm_filter")
        {
            if let Some(realm) = predicate.get("realm_id") {
                resources.retain(|r| {
                    r.attributes
                        .get("realm_id")
                        .is_some_and(|value| realm.matches(value))
                });
            }
        }
        Ok(resources)
    }

    async fn create(
        &self,
        credentials: &Credentials,
        request: &CreateRequest,
    ) -> anyhow::Result<Resource> {
        self.enter(credentials).await?;
        let resource = self.create_resource(request).await?;
        tracing::info!("Mock created {} {}", resource.collection, resource.id);
        Ok(resource)
    }

    async fn destroy(
        &self,
        credentials: &Credentials,
        collection: Collection,
        id: &str,
    ) -> anyhow::Result<()> {
        self.enter(credentials).await?;
        if collection == Collection::Realms {
            return Err(MockError::ReadOnly(collection.to_string()).into());
        }
        self.store
            .remove(collection, id)
            .await
            .ok_or_else(|| MockError::not_found(collection, id))?;
        tracing::info!("Mock destroyed {} {}", collection, id);
        Ok(())
    }

    async fn perform(
        &self,
        credentials: &Credentials,
        collection: Collection,
        id: &str,
        action: &str,
    ) -> anyhow::Result<Resource> {
        self.enter(credentials).await?;
        let resource = self.require(collection, id).await?;
        let lifecycle = self
            .declarations
            .lifecycle(collection)
            .ok_or_else(|| MockError::ReadOnly(collection.to_string()))?;
        let current = resource
            .state
            .as_deref()
            .and_then(|s| lifecycle.resolve(s))
            .unwrap_or(lifecycle.initial());
        let next = lifecycle.apply(current, action)?;

        if lifecycle.is_terminal(next) {
            self.store.remove(collection, id).await;
            return Ok(resource.with_state(next.to_uppercase()));
        }
        self.store
            .set_state(collection, id, next)
            .await
            .ok_or_else(|| MockError::not_found(collection, id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_driver::{InstanceParams, VolumeParams};

    fn credentials() -> Credentials {
        Credentials::new(MOCK_USER, MOCK_PASSWORD)
    }

    #[tokio::test]
    async fn test_check_auth() {
        let driver = MockDriver::new().unwrap();
        let ok = driver.check_auth(&credentials()).await.unwrap();
        assert!(ok.authenticated);

        let failed = driver
            .check_auth(&Credentials::new("mockuser", "wrong"))
            .await
            .unwrap();
        assert!(!failed.authenticated);
    }

    #[tokio::test]
    async fn test_wrong_credentials_fail_hooks() {
        let driver = MockDriver::new().unwrap();
        let err = driver
            .list(
                &Credentials::new("eve", "x"),
                Collection::Realms,
                &FilterPredicate::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed for user eve");
    }

    #[tokio::test]
    async fn test_realm_filter_narrows_instances() {
        let driver = MockDriver::new().unwrap();
        let predicate = FilterPredicate::new().with("realm_id", "eu");
        let instances = driver
            .list(&credentials(), Collection::Instances, &predicate)
            .await
            .unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id, "inst1");
    }

    #[tokio::test]
    async fn test_created_instance_advances_on_read() {
        let driver = MockDriver::new().unwrap();
        let request = CreateRequest {
            params: CreateParams::Instance(InstanceParams::new("img1")),
            profile: None,
        };
        let created = driver.create(&credentials(), &request).await.unwrap();
        assert_eq!(created.state.as_deref(), Some("PENDING"));

        let read = driver
            .get(&credentials(), Collection::Instances, &created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.state.as_deref(), Some("RUNNING"));
    }

    #[tokio::test]
    async fn test_create_from_missing_image() {
        let driver = MockDriver::new().unwrap();
        let request = CreateRequest {
            params: CreateParams::Instance(InstanceParams::new("img99")),
            profile: None,
        };
        let err = driver.create(&credentials(), &request).await.unwrap_err();
        assert_eq!(err.to_string(), "images img99 not found");
    }

    #[tokio::test]
    async fn test_volume_quota() {
        let driver = MockDriver::new().unwrap();
        let request = CreateRequest {
            params: CreateParams::StorageVolume(VolumeParams {
                capacity: Some(STORAGE_QUOTA_GB),
                ..Default::default()
            }),
            profile: None,
        };
        let err = driver.create(&credentials(), &request).await.unwrap_err();
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn test_default_realm() {
        let driver = MockDriver::new().unwrap().with_default_realm("eu");
        let request = CreateRequest {
            params: CreateParams::Instance(InstanceParams::new("img1")),
            profile: None,
        };
        let created = driver.create(&credentials(), &request).await.unwrap();
        assert_eq!(created.get_attribute::<String>("realm_id").as_deref(), Some("eu"));

        let driver = MockDriver::new().unwrap().with_default_realm("mars");
        let err = driver.create(&credentials(), &request).await.unwrap_err();
        assert_eq!(err.to_string(), "realms mars not found");
    }

    #[tokio::test]
    async fn test_perform_destroy_removes_instance() {
        let driver = MockDriver::new().unwrap();
        let finished = driver
            .perform(&credentials(), Collection::Instances, "inst1", "destroy")
            .await
            .unwrap();
        assert_eq!(finished.state.as_deref(), Some("FINISH"));
        assert!(driver
            .store()
            .get(Collection::Instances, "inst1")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let driver = MockDriver::new().unwrap();
        driver.store().fail_next("request timed out").await;
        let err = driver
            .list(&credentials(), Collection::Realms, &FilterPredicate::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "request timed out");
        assert!(driver
            .list(&credentials(), Collection::Realms, &FilterPredicate::new())
            .await
            .is_ok());
    }
}
