pub mod catalog;
pub mod resources;

use anyhow::{Context as _, bail};
use nimbus_config::NimbusConfig;
use nimbus_driver::{Credentials, Dispatcher, Driver};
use nimbus_driver_mock::MockDriver;
use std::sync::Arc;

/// Drivers this binary can load, as (name, display name)
pub const DRIVERS: &[(&str, &str)] = &[("mock", "Mock")];

/// Load a driver by name; `provider` picks the mock's default realm
pub fn load_driver(name: &str, provider: Option<&str>) -> anyhow::Result<Arc<dyn Driver>> {
    match name {
        "mock" => {
            let driver = MockDriver::new().context("failed to initialise the mock driver")?;
            Ok(Arc::new(match provider {
                Some(realm) => driver.with_default_realm(realm),
                None => driver,
            }))
        }
        other => bail!(
            "unknown driver '{}'. Available drivers: {}",
            other,
            DRIVERS
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Everything a command needs to talk to the configured driver
pub struct Context {
    pub dispatcher: Dispatcher,
    credentials: Option<Credentials>,
    pub json: bool,
}

impl Context {
    pub fn new(
        config: &NimbusConfig,
        user: Option<String>,
        password: Option<String>,
        json: bool,
    ) -> anyhow::Result<Self> {
        let driver = load_driver(&config.driver, config.provider.as_deref())?;
        tracing::debug!("Using driver {}", driver.name());

        let configured = config.credentials.as_ref();
        let user = user.or_else(|| configured.map(|c| c.user.clone()));
        let password = password.or_else(|| configured.map(|c| c.password.clone()));
        let credentials = match (user, password) {
            (Some(user), Some(password)) => Some(Credentials::new(user, password)),
            _ => None,
        };

        Ok(Self {
            dispatcher: Dispatcher::new(driver),
            credentials,
            json,
        })
    }

    /// Credentials for backend calls; catalog commands never need them
    pub fn credentials(&self) -> anyhow::Result<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "no credentials configured. Use --user/--password, NIMBUS_USER/NIMBUS_PASSWORD or the credentials section of nimbus.yaml"
            )
        })
    }
}

/// Split `KEY=VALUE` arguments
pub fn parse_pairs(pairs: &[String]) -> anyhow::Result<Vec<(&str, &str)>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim(), value.trim()))
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| anyhow::anyhow!("expected KEY=VALUE, got '{}'", pair))
        })
        .collect()
}
