//! Backend failure translation
//!
//! Vendor SDKs fail with free-text messages. Each driver registers an
//! ordered list of rules mapping message patterns to status codes; the first
//! matching rule classifies the failure. Every backend call made by the
//! dispatcher goes through [`ErrorTranslator::guard`], so nothing but a
//! [`UniformError`] ever leaves the driver boundary.

use crate::error::{RegistrationError, Result, UniformError};
use regex::{Regex, RegexBuilder};
use std::future::Future;

/// How a rule recognises a failure message
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Case-insensitive regular expression
    Pattern(Regex),
    /// Case-insensitive substring, stored lowercased
    Substring(String),
}

impl Matcher {
    pub fn is_match(&self, message: &str) -> bool {
        match self {
            Matcher::Pattern(regex) => regex.is_match(message),
            Matcher::Substring(needle) => message.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// A single (matcher, status) rule
#[derive(Debug, Clone)]
pub struct ErrorRule {
    pub matcher: Matcher,
    pub status: u16,
}

/// Ordered error rules declared by one driver
#[derive(Debug, Clone, Default)]
pub struct ErrorTranslator {
    rules: Vec<ErrorRule>,
}

impl ErrorTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a case-insensitive regex rule
    pub fn register_pattern(
        &mut self,
        pattern: &str,
        status: u16,
    ) -> std::result::Result<(), RegistrationError> {
        check_status(status)?;
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RegistrationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        tracing::debug!("Registered error pattern /{}/ -> {}", pattern, status);
        self.rules.push(ErrorRule {
            matcher: Matcher::Pattern(regex),
            status,
        });
        Ok(())
    }

    /// Append a case-insensitive substring rule
    pub fn register_substring(
        &mut self,
        text: &str,
        status: u16,
    ) -> std::result::Result<(), RegistrationError> {
        check_status(status)?;
        tracing::debug!("Registered error substring {:?} -> {}", text, status);
        self.rules.push(ErrorRule {
            matcher: Matcher::Substring(text.to_lowercase()),
            status,
        });
        Ok(())
    }

    pub fn rules(&self) -> &[ErrorRule] {
        &self.rules
    }

    /// Classify `message` by the first matching rule, defaulting to 500
    pub fn translate(&self, message: &str) -> UniformError {
        match self.rules.iter().find(|r| r.matcher.is_match(message)) {
            Some(rule) => UniformError::with_status(rule.status, message),
            None => UniformError::unexpected(message),
        }
    }

    /// Translate a failure raised by a backend hook.
    ///
    /// A failure that already is a [`UniformError`] passes through unchanged,
    /// so drivers can raise precise errors such as not-found directly.
    pub fn translate_error(&self, err: &anyhow::Error) -> UniformError {
        if let Some(uniform) = err.downcast_ref::<UniformError>() {
            return uniform.clone();
        }
        let translated = self.translate(&format!("{:#}", err));
        tracing::warn!(
            "Backend failure translated to {}: {}",
            translated.status,
            translated.message
        );
        translated
    }

    /// Run a backend operation, translating its failure
    pub async fn guard<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        operation.await.map_err(|err| self.translate_error(&err))
    }
}

fn check_status(status: u16) -> std::result::Result<(), RegistrationError> {
    if (400..=599).contains(&status) {
        Ok(())
    } else {
        Err(RegistrationError::InvalidStatus(status))
    }
}
