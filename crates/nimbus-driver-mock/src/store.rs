//! In-memory backend
//!
//! Plays the part a vendor SDK plays for real drivers: it stores resources
//! with backend-style uppercase states and moves automatic transitions
//! forward one step every time the driver reads it.

use crate::error::{MockError, Result};
use chrono::{TimeZone, Utc};
use nimbus_driver::{Collection, Lifecycle, Resource};
use serde_json::json;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

pub const OWNER: &str = "mockuser";

/// Seeded resource table keyed by collection and id
pub struct MockStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    resources: BTreeMap<Collection, BTreeMap<String, Resource>>,
    next_id: u64,
    pending_failure: Option<String>,
}

impl MockStore {
    /// Store without any resources
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// Store with the standard mock realms, images, instances and storage
    pub fn seeded() -> Self {
        let mut inner = StoreInner::default();
        for resource in seed() {
            inner
                .resources
                .entry(resource.collection)
                .or_default()
                .insert(resource.id.clone(), resource);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Make the next backend call fail with `message`
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.inner.write().await.pending_failure = Some(message.into());
    }

    /// Consume a failure scheduled with [`MockStore::fail_next`]
    pub async fn take_failure(&self) -> Option<String> {
        self.inner.write().await.pending_failure.take()
    }

    /// Advance every resource of `collection` one automatic step
    pub async fn tick(&self, collection: Collection, lifecycle: &Lifecycle) {
        let mut inner = self.inner.write().await;
        let Some(resources) = inner.resources.get_mut(&collection) else {
            return;
        };
        for resource in resources.values_mut() {
            let Some(reported) = resource.state.as_deref() else {
                continue;
            };
            let Some(current) = lifecycle.resolve(reported) else {
                continue;
            };
            let next = lifecycle.advance_automatic(current);
            if next != current {
                tracing::debug!("Mock {} {} advanced to {}", collection, resource.id, next);
                resource.state = Some(next.to_uppercase());
            }
        }
    }

    pub async fn list(&self, collection: Collection) -> Vec<Resource> {
        self.inner
            .read()
            .await
            .resources
            .get(&collection)
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn get(&self, collection: Collection, id: &str) -> Option<Resource> {
        self.inner
            .read()
            .await
            .resources
            .get(&collection)
            .and_then(|r| r.get(id))
            .cloned()
    }

    /// Insert `resource` under a fresh id built from `prefix`
    pub async fn insert(&self, prefix: &str, resource: Resource) -> Resource {
        self.inner.write().await.insert(prefix, resource)
    }

    /// Insert a storage volume of `capacity` GB unless that would push the
    /// total past `quota`; checked and inserted under one lock
    pub async fn insert_within_quota(
        &self,
        prefix: &str,
        resource: Resource,
        capacity: i64,
        quota: i64,
    ) -> Result<Resource> {
        let mut inner = self.inner.write().await;
        let available = quota - inner.used_storage();
        if capacity > available {
            return Err(MockError::QuotaExceeded {
                requested: capacity,
                available,
            });
        }
        Ok(inner.insert(prefix, resource))
    }

    /// Replace the stored state, returning the updated resource
    pub async fn set_state(&self, collection: Collection, id: &str, state: &str) -> Option<Resource> {
        let mut inner = self.inner.write().await;
        let resource = inner.resources.get_mut(&collection)?.get_mut(id)?;
        resource.state = Some(state.to_uppercase());
        Some(resource.clone())
    }

    pub async fn remove(&self, collection: Collection, id: &str) -> Option<Resource> {
        self.inner
            .write()
            .await
            .resources
            .get_mut(&collection)?
            .remove(id)
    }

    /// Sum of `capacity` over all storage volumes
    pub async fn used_storage(&self) -> i64 {
        self.inner.read().await.used_storage()
    }
}

impl StoreInner {
    fn insert(&mut self, prefix: &str, mut resource: Resource) -> Resource {
        self.next_id += 1;
        resource.id = format!("{}-{}", prefix, self.next_id);
        self.resources
            .entry(resource.collection)
            .or_default()
            .insert(resource.id.clone(), resource.clone());
        resource
    }

    fn used_storage(&self) -> i64 {
        self.resources
            .get(&Collection::StorageVolumes)
            .map(|volumes| {
                volumes
                    .values()
                    .filter_map(|v| v.get_attribute::<i64>("capacity"))
                    .sum()
            })
            .unwrap_or_default()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::seeded()
    }
}

fn seed() -> Vec<Resource> {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).single();
    let stamp = |resource: Resource| match created_at {
        Some(at) => resource.with_created_at(at),
        None => resource,
    };

    vec![
        Resource::new(Collection::Realms, "us")
            .with_state("AVAILABLE")
            .with_attribute("name", json!("United States"))
            .with_attribute("limit", json!("")),
        Resource::new(Collection::Realms, "eu")
            .with_state("AVAILABLE")
            .with_attribute("name", json!("Europe"))
            .with_attribute("limit", json!("")),
        Resource::new(Collection::Images, "img1")
            .with_owner("fedoraproject")
            .with_attribute("name", json!("Fedora 40"))
            .with_attribute("architecture", json!("x86_64"))
            .with_attribute("description", json!("Fedora 40 server")),
        Resource::new(Collection::Images, "img2")
            .with_owner("fedoraproject")
            .with_attribute("name", json!("Fedora 40 i386"))
            .with_attribute("architecture", json!("i386"))
            .with_attribute("description", json!("Fedora 40 server, 32 bit")),
        Resource::new(Collection::Images, "img3")
            .with_owner(OWNER)
            .with_attribute("name", json!("Custom web"))
            .with_attribute("architecture", json!("x86_64"))
            .with_attribute("description", json!("Web server snapshot")),
        stamp(
            Resource::new(Collection::Instances, "inst0")
                .with_owner(OWNER)
                .with_state("RUNNING")
                .with_attribute("name", json!("Mock Instance With Profile Change"))
                .with_attribute("image_id", json!("img1"))
                .with_attribute("realm_id", json!("us"))
                .with_attribute("hardware_profile", json!("m1-large"))
                .with_attribute("public_addresses", json!(["img1.inst0.public.com"])),
        ),
        stamp(
            Resource::new(Collection::Instances, "inst1")
                .with_owner(OWNER)
                .with_state("STOPPED")
                .with_attribute("name", json!("MockUserInstance"))
                .with_attribute("image_id", json!("img3"))
                .with_attribute("realm_id", json!("eu"))
                .with_attribute("hardware_profile", json!("m1-small"))
                .with_attribute("public_addresses", json!(["img3.inst1.public.com"])),
        ),
        stamp(
            Resource::new(Collection::StorageVolumes, "vol1")
                .with_owner(OWNER)
                .with_state("AVAILABLE")
                .with_attribute("capacity", json!(15))
                .with_attribute("realm_id", json!("us")),
        ),
        stamp(
            Resource::new(Collection::StorageVolumes, "vol2")
                .with_owner(OWNER)
                .with_state("IN-USE")
                .with_attribute("capacity", json!(40))
                .with_attribute("realm_id", json!("us"))
                .with_attribute("instance_id", json!("inst0")),
        ),
        stamp(
            Resource::new(Collection::StorageSnapshots, "snap1")
                .with_owner(OWNER)
                .with_state("COMPLETED")
                .with_attribute("volume_id", json!("vol1")),
        ),
    ]
}
