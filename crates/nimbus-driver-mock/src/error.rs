//! Mock driver error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockError {
    #[error("Authentication failed for user {0}")]
    AuthenticationFailed(String),

    #[error("{collection} {id} not found")]
    NotFound { collection: String, id: String },

    #[error("storage quota exceeded: {requested} GB requested, {available} GB available")]
    QuotaExceeded { requested: i64, available: i64 },

    #[error("{0} are read-only")]
    ReadOnly(String),

    #[error("{0}")]
    Injected(String),

    #[error("Invalid driver declarations: {0}")]
    Registration(#[from] nimbus_driver::RegistrationError),
}

impl MockError {
    pub fn not_found(collection: impl std::fmt::Display, id: &str) -> Self {
        MockError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MockError>;
