//! Mock driver for Nimbus
//!
//! This crate implements the Driver trait against an in-memory backend,
//! which makes it the reference for how a driver declares itself and the
//! backend used by the CLI and the scenario tests.
//!
//! # Features
//!
//! - Seeded realms, images, instances, storage volumes and snapshots
//! - Instance and storage volume lifecycles that advance on every read
//! - Storage quota and failure injection to exercise error translation
//!
//! # Example
//!
//! ```ignore
//! use nimbus_driver::{Collection, Credentials, Dispatcher, FilterPredicate};
//! use nimbus_driver_mock::MockDriver;
//! use std::sync::Arc;
//!
//! let dispatcher = Dispatcher::new(Arc::new(MockDriver::new()?));
//! let credentials = Credentials::new("mockuser", "mockpassword");
//!
//! let running = FilterPredicate::new().with("state", "running");
//! let instances = dispatcher
//!     .list(&credentials, Collection::Instances, &running)
//!     .await?;
//! ```

pub mod declarations;
pub mod driver;
pub mod error;
pub mod store;

pub use declarations::{STORAGE_QUOTA_GB, declarations};
pub use driver::{DEFAULT_REALM, MOCK_PASSWORD, MOCK_USER, MockDriver};
pub use error::{MockError, Result};
pub use store::MockStore;
