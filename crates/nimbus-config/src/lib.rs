pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CANDIDATES: [&str; 4] = [
    "nimbus.local.yaml",
    ".nimbus.local.yaml",
    "nimbus.yaml",
    ".nimbus.yaml",
];

/// Nimbus settings shared by the CLI and embedding front ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NimbusConfig {
    /// Driver to load (e.g. "mock")
    pub driver: String,

    /// Provider within the driver, for drivers that front several endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsConfig>,

    /// Tracing filter used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for NimbusConfig {
    fn default() -> Self {
        Self {
            driver: "mock".to_string(),
            provider: None,
            credentials: None,
            log_filter: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub user: String,
    pub password: String,
}

impl NimbusConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config =
            serde_yaml::from_str::<Self>(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the first config file found, or defaults when there is none,
    /// then apply environment overrides
    pub fn discover() -> Result<Self> {
        let config = match find_config_file() {
            Ok(path) => Self::load(&path)?,
            Err(ConfigError::ConfigFileNotFound) => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        Ok(config.with_env_overrides())
    }

    /// Apply NIMBUS_DRIVER, NIMBUS_USER and NIMBUS_PASSWORD
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(driver) = std::env::var("NIMBUS_DRIVER") {
            self.driver = driver;
        }
        let user = std::env::var("NIMBUS_USER").ok();
        let password = std::env::var("NIMBUS_PASSWORD").ok();
        if user.is_some() || password.is_some() {
            let current = self.credentials.take();
            self.credentials = Some(CredentialsConfig {
                user: user
                    .or_else(|| current.as_ref().map(|c| c.user.clone()))
                    .unwrap_or_default(),
                password: password
                    .or_else(|| current.as_ref().map(|c| c.password.clone()))
                    .unwrap_or_default(),
            });
        }
        self
    }
}

/// Nimbus global config directory; not created when missing
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("nimbus"))
        .ok_or(ConfigError::ConfigDirNotFound)
}

/// Locate the config file.
///
/// Search order:
/// 1. NIMBUS_CONFIG_PATH
/// 2. Current directory: nimbus.local.yaml, .nimbus.local.yaml, nimbus.yaml, .nimbus.yaml
/// 3. ./.nimbus/ with the same names
/// 4. ~/.config/nimbus/nimbus.yaml
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("NIMBUS_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("NIMBUS_CONFIG_PATH {} does not exist", path.display());
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let nimbus_dir = current_dir.join(".nimbus");
    if nimbus_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = nimbus_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("nimbus.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}
