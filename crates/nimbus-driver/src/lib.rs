//! Nimbus driver framework
//!
//! This crate provides the vendor-neutral core of Nimbus: the declarations a
//! cloud driver makes about itself and the contract every driver call goes
//! through.
//!
//! # Declarations
//!
//! - **Hardware profiles**: named templates of bounded properties
//! - **Capabilities**: optional features per collection, with constraints
//! - **Lifecycles**: per-collection state machines
//! - **Error rules**: message patterns mapped to status codes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   Nimbus CLI                     │
//! │          (nimbus list/create/act/...)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                nimbus-driver                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │               Dispatcher                  │   │
//! │  │  capability / legality / state / errors   │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Declarations │  │    Filter    │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │ trait Driver { ... }
//! ┌───────▼───────┐ ┌───────────────┐
//! │     mock      │ │  vendor SDK   │
//! │    driver     │ │    drivers    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod capability;
pub mod declarations;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod params;
pub mod profile;
pub mod resource;
pub mod translate;

// Re-exports
pub use capability::{CapabilityRegistry, Constraints};
pub use declarations::{Declarations, DeclarationsBuilder};
pub use dispatch::Dispatcher;
pub use driver::{AuthStatus, Credentials, Driver};
pub use error::{ErrorKind, RegistrationError, Result, UniformError};
pub use filter::{Criterion, FilterPredicate, Filterable, filter, filter_on};
pub use lifecycle::{Lifecycle, LifecycleBuilder, StateInfo, Transition, TransitionInfo, Trigger};
pub use params::{
    CreateParams, CreateRequest, ImageParams, InstanceParams, ProfileSelection, SnapshotParams,
    VolumeParams,
};
pub use profile::{
    Domain, HardwareProfile, ProfileConfiguration, ProfilePredicate, ProfileRegistry, Property,
    PropertyValue, filter_profiles,
};
pub use resource::{Collection, Resource, UnknownCollection};
pub use translate::{ErrorRule, ErrorTranslator, Matcher};
