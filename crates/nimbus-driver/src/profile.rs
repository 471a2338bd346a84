//! Hardware profiles
//!
//! A [`HardwareProfile`] is a named template of bounded properties (cpu,
//! memory, storage, architecture, ...). Profiles are declared once when a
//! driver is built and never change afterwards; a request selects a profile
//! and may override property values inside their domains, which yields a
//! separate [`ProfileConfiguration`].

use crate::error::{RegistrationError, Result, UniformError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single property value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Text(String),
}

impl PropertyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            PropertyValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Int(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Int(i64::from(n))
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

/// Set of values a property may take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Domain {
    /// One of an explicit list of values
    Fixed { values: Vec<PropertyValue> },
    /// Any integer in `min..=max`
    Range { min: i64, max: i64 },
    /// `min + k * step` for integer `k`, within `min..=max`
    Stepped { min: i64, max: i64, step: i64 },
}

impl Domain {
    pub fn contains(&self, value: &PropertyValue) -> bool {
        self.canonical(value).is_some()
    }

    /// `value` as the domain spells it, or `None` when outside the domain
    pub fn canonical(&self, value: &PropertyValue) -> Option<PropertyValue> {
        match self {
            Domain::Fixed { values } => values
                .iter()
                .find(|v| match v {
                    PropertyValue::Int(n) => value.as_int() == Some(*n),
                    PropertyValue::Text(_) => *v == value,
                })
                .cloned(),
            Domain::Range { min, max } => value
                .as_int()
                .filter(|n| (*min..=*max).contains(n))
                .map(PropertyValue::Int),
            Domain::Stepped { min, max, step } => value
                .as_int()
                .filter(|n| {
                    (*min..=*max).contains(n) && n.abs_diff(*min) % step.unsigned_abs() == 0
                })
                .map(PropertyValue::Int),
        }
    }

    /// Value used when neither a default nor an override is given
    fn first(&self) -> Option<PropertyValue> {
        match self {
            Domain::Fixed { values } => values.first().cloned(),
            Domain::Range { min, .. } | Domain::Stepped { min, .. } => {
                Some(PropertyValue::Int(*min))
            }
        }
    }

    fn check(&self) -> std::result::Result<(), String> {
        match self {
            Domain::Fixed { values } if values.is_empty() => Err("has no values".to_string()),
            Domain::Range { min, max } | Domain::Stepped { min, max, .. } if min > max => {
                Err(format!("has an inverted range {}..{}", min, max))
            }
            Domain::Stepped { step, .. } if *step <= 0 => {
                Err(format!("has a non-positive step {}", step))
            }
            _ => Ok(()),
        }
    }
}

/// A named property of a hardware profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<PropertyValue>,
}

impl Property {
    /// Property restricted to the listed values
    pub fn fixed<V: Into<PropertyValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Fixed {
                values: values.into_iter().map(Into::into).collect(),
            },
            default: None,
        }
    }

    pub fn range(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Range { min, max },
            default: None,
        }
    }

    pub fn stepped(name: impl Into<String>, min: i64, max: i64, step: i64) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Stepped { min, max, step },
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Unit reported to clients for well-known properties
    pub fn unit(&self) -> &'static str {
        match self.name.as_str() {
            "cpu" => "count",
            "memory" => "MB",
            "storage" => "GB",
            _ => "label",
        }
    }

    pub fn contains(&self, value: &PropertyValue) -> bool {
        self.domain.contains(value)
    }

    /// Declared default, or the first value of the domain
    pub fn default_value(&self) -> Option<PropertyValue> {
        self.default.clone().or_else(|| self.domain.first())
    }

    /// Whether the declared default (if any) lies within the domain
    pub fn default_within_domain(&self) -> bool {
        self.default.as_ref().is_none_or(|d| self.contains(d))
    }
}

/// Named hardware configuration a backend can provision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub name: String,
    pub properties: Vec<Property>,
}

impl HardwareProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Check the profile's structural invariants
    pub fn validate(&self) -> std::result::Result<(), RegistrationError> {
        let invalid = |property: &Property, reason: String| RegistrationError::InvalidProfile {
            profile: self.name.clone(),
            property: property.name.clone(),
            reason,
        };

        for (index, property) in self.properties.iter().enumerate() {
            property.domain.check().map_err(|r| invalid(property, r))?;
            if !property.default_within_domain() {
                let default = property.default.as_ref().map(ToString::to_string);
                return Err(invalid(
                    property,
                    format!("default {} is outside its domain", default.unwrap_or_default()),
                ));
            }
            if self.properties[..index].iter().any(|p| p.name == property.name) {
                return Err(invalid(property, "is declared twice".to_string()));
            }
        }
        Ok(())
    }

    /// Whether the profile satisfies every key of `predicate`
    pub fn matches(&self, predicate: &ProfilePredicate) -> bool {
        predicate.criteria.iter().all(|(key, value)| match key.as_str() {
            "id" | "name" => value.to_string() == self.name,
            _ => self.get(key).is_some_and(|p| p.contains(value)),
        })
    }

    /// Derive a concrete configuration from defaults and `overrides`
    pub fn configure(
        &self,
        overrides: &BTreeMap<String, PropertyValue>,
    ) -> Result<ProfileConfiguration> {
        for (name, value) in overrides {
            let property = self.get(name).ok_or_else(|| {
                UniformError::validation(format!(
                    "hardware profile {} has no property {}",
                    self.name, name
                ))
            })?;
            if !property.contains(value) {
                return Err(UniformError::validation(format!(
                    "value {} for {} is outside the domain of hardware profile {}",
                    value, name, self.name
                )));
            }
        }

        let values = self
            .properties
            .iter()
            .filter_map(|p| {
                let value = match overrides.get(&p.name) {
                    Some(v) => p.domain.canonical(v),
                    None => p.default_value(),
                };
                value.map(|v| (p.name.clone(), v))
            })
            .collect();

        Ok(ProfileConfiguration {
            profile: self.name.clone(),
            values,
        })
    }
}

/// A profile selection with every property resolved to one value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfiguration {
    pub profile: String,
    pub values: BTreeMap<String, PropertyValue>,
}

impl ProfileConfiguration {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropertyValue::as_int)
    }
}

/// Property name → desired value; `id`/`name` match the profile name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePredicate {
    criteria: BTreeMap<String, PropertyValue>,
}

impl ProfilePredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.criteria.insert(key.into(), value.into());
        self
    }

    /// Build from front-end options; empty values impose no constraint
    pub fn from_options<'a>(options: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let criteria = options
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.to_string(), PropertyValue::from(value)))
            .collect();
        Self { criteria }
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// Profiles declared by one driver, in registration order
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<HardwareProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `profile`; an existing name is rejected, never overwritten
    pub fn define(
        &mut self,
        profile: HardwareProfile,
    ) -> std::result::Result<&HardwareProfile, RegistrationError> {
        if self.get(&profile.name).is_some() {
            return Err(RegistrationError::DuplicateProfile(profile.name));
        }
        profile.validate()?;
        tracing::debug!("Defined hardware profile: {}", profile.name);
        let index = self.profiles.len();
        self.profiles.push(profile);
        Ok(&self.profiles[index])
    }

    pub fn all(&self) -> &[HardwareProfile] {
        &self.profiles
    }

    pub fn get(&self, name: &str) -> Option<&HardwareProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Profiles matching `predicate`, in registration order
    pub fn filter(&self, predicate: &ProfilePredicate) -> Vec<&HardwareProfile> {
        filter_profiles(self.profiles.iter(), predicate)
    }
}

/// Narrow any sequence of profiles by `predicate`
pub fn filter_profiles<'a>(
    profiles: impl IntoIterator<Item = &'a HardwareProfile>,
    predicate: &ProfilePredicate,
) -> Vec<&'a HardwareProfile> {
    profiles.into_iter().filter(|p| p.matches(predicate)).collect()
}
