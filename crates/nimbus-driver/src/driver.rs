//! Driver trait definition

use crate::declarations::Declarations;
use crate::filter::FilterPredicate;
use crate::params::CreateRequest;
use crate::resource::{Collection, Resource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Backend integration trait
///
/// Every backend (a vendor SDK wrapper, a CLI wrapper, the mock driver)
/// implements this trait. The hooks talk to the backend only; front ends go
/// through [`crate::Dispatcher`], which checks capabilities and legal actions,
/// computes lifecycle state and translates failures around each hook.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Returns the driver name (e.g., "mock", "ec2")
    fn name(&self) -> &str;

    /// Returns the driver display name for UI
    fn display_name(&self) -> &str;

    /// Profiles, features, lifecycles and error rules of this driver
    fn declarations(&self) -> &Declarations;

    /// Collections this driver serves
    fn collections(&self) -> &[Collection];

    /// Check whether `credentials` are accepted by the backend
    async fn check_auth(&self, credentials: &Credentials) -> anyhow::Result<AuthStatus>;

    /// List resources of `collection`.
    ///
    /// Backends may narrow results with `predicate` when their API supports
    /// it; the dispatcher filters again afterwards.
    async fn list(
        &self,
        credentials: &Credentials,
        collection: Collection,
        predicate: &FilterPredicate,
    ) -> anyhow::Result<Vec<Resource>>;

    /// Fetch a single resource
    async fn get(
        &self,
        credentials: &Credentials,
        collection: Collection,
        id: &str,
    ) -> anyhow::Result<Option<Resource>> {
        let predicate = FilterPredicate::new().with("id", id);
        let resources = self.list(credentials, collection, &predicate).await?;
        Ok(resources.into_iter().find(|r| r.id == id))
    }

    /// Create a resource from validated parameters
    async fn create(
        &self,
        credentials: &Credentials,
        request: &CreateRequest,
    ) -> anyhow::Result<Resource>;

    /// Destroy a resource
    async fn destroy(
        &self,
        credentials: &Credentials,
        collection: Collection,
        id: &str,
    ) -> anyhow::Result<()>;

    /// Run a lifecycle action that the dispatcher already found legal
    async fn perform(
        &self,
        credentials: &Credentials,
        collection: Collection,
        id: &str,
        action: &str,
    ) -> anyhow::Result<Resource>;
}

/// Credentials passed through to backend calls
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}
