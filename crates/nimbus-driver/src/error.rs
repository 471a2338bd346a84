//! Driver error types
//!
//! Two families of errors exist. [`RegistrationError`] is raised while a
//! driver declares its profiles, features, lifecycles and error rules; it is
//! fatal and aborts driver construction. [`UniformError`] is the only error
//! a request-handling operation ever returns to the front end.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building driver declarations
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Hardware profile already defined: {0}")]
    DuplicateProfile(String),

    #[error("Invalid hardware profile {profile}: property {property} {reason}")]
    InvalidProfile {
        profile: String,
        property: String,
        reason: String,
    },

    #[error("Invalid state machine: {0}")]
    InvalidMachine(String),

    #[error("Lifecycle already defined for collection: {0}")]
    DuplicateLifecycle(String),

    #[error("Invalid error pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid status code {0}: error rules must map to 400..=599")]
    InvalidStatus(u16),
}

/// Classification of a [`UniformError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    IllegalTransition,
    Conflict,
    UnexpectedBackendFailure,
    NotSupported,
    ProviderError,
    Unavailable,
    Timeout,
}

impl ErrorKind {
    /// Canonical status code for this kind
    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::IllegalTransition => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::UnexpectedBackendFailure => 500,
            ErrorKind::NotSupported => 501,
            ErrorKind::ProviderError => 502,
            ErrorKind::Unavailable => 503,
            ErrorKind::Timeout => 504,
        }
    }

    /// Classify a status code registered by a driver error rule.
    ///
    /// Codes without a dedicated kind fall back by class: other 4xx codes
    /// are validation failures, everything else is an unexpected failure.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            405 => ErrorKind::IllegalTransition,
            409 => ErrorKind::Conflict,
            501 => ErrorKind::NotSupported,
            502 => ErrorKind::ProviderError,
            503 => ErrorKind::Unavailable,
            504 => ErrorKind::Timeout,
            400..=499 => ErrorKind::Validation,
            _ => ErrorKind::UnexpectedBackendFailure,
        }
    }

    /// Whether the caller, rather than the backend, is at fault
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation failure"),
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::Forbidden => write!(f, "forbidden"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::IllegalTransition => write!(f, "illegal transition"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::UnexpectedBackendFailure => write!(f, "unexpected backend failure"),
            ErrorKind::NotSupported => write!(f, "not supported"),
            ErrorKind::ProviderError => write!(f, "provider error"),
            ErrorKind::Unavailable => write!(f, "unavailable"),
            ErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// The error every contract operation surfaces to the front end
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} ({status}): {message}")]
pub struct UniformError {
    /// HTTP-style status code
    pub status: u16,

    /// Classification derived from the status
    pub kind: ErrorKind,

    /// Original failure message, verbatim
    pub message: String,
}

impl UniformError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: kind.status(),
            kind,
            message: message.into(),
        }
    }

    /// Build an error for a status registered by a driver error rule
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: ErrorKind::from_status(status),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(collection: impl std::fmt::Display, id: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{} {} not found", collection, id))
    }

    pub fn illegal_transition(state: &str, action: &str) -> Self {
        Self::new(
            ErrorKind::IllegalTransition,
            format!("action {} is not allowed in state {}", action, state),
        )
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedBackendFailure, message)
    }
}

pub type Result<T> = std::result::Result<T, UniformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_roundtrip() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::Unauthorized,
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::IllegalTransition,
            ErrorKind::Conflict,
            ErrorKind::UnexpectedBackendFailure,
            ErrorKind::NotSupported,
            ErrorKind::ProviderError,
            ErrorKind::Unavailable,
            ErrorKind::Timeout,
        ] {
            assert_eq!(ErrorKind::from_status(kind.status()), kind);
        }
    }

    #[test]
    fn test_unlisted_status_falls_back_by_class() {
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(507), ErrorKind::UnexpectedBackendFailure);
    }

    #[test]
    fn test_display_keeps_message() {
        let err = UniformError::with_status(401, "Authentication failed: bad token");
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(
            err.to_string(),
            "unauthorized (401): Authentication failed: bad token"
        );
    }

    #[test]
    fn test_serializes_status_kind_message() {
        let err = UniformError::illegal_transition("running", "reboot");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], 405);
        assert_eq!(json["kind"], "illegal_transition");
        assert_eq!(json["message"], "action reboot is not allowed in state running");
    }
}
