//! Predicate filtering over result collections

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Items that expose named attributes to a [`FilterPredicate`]
pub trait Filterable {
    /// Value of `name`, or `None` when the item has no such attribute
    fn attribute(&self, name: &str) -> Option<Value>;
}

/// Desired value for a single attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Criterion {
    /// Attribute must equal one of the listed values
    OneOf(Vec<Value>),
    /// Attribute must equal the value exactly
    Equals(Value),
}

impl Criterion {
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Criterion::Equals(expected) => expected == actual,
            Criterion::OneOf(expected) => expected.iter().any(|e| e == actual),
        }
    }
}

/// Unordered attribute → criterion mapping
///
/// A key mapped to `None` imposes no constraint, mirroring an option the
/// caller left blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    criteria: BTreeMap<String, Option<Criterion>>,
}

impl FilterPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `attribute` to equal `value`
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.criteria
            .insert(attribute.into(), Some(Criterion::Equals(value.into())));
        self
    }

    /// Require `attribute` to equal any of `values`
    pub fn with_any<V: Into<Value>>(
        mut self,
        attribute: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.criteria
            .insert(attribute.into(), Some(Criterion::OneOf(values)));
        self
    }

    /// Mention `attribute` without constraining it
    pub fn without(mut self, attribute: impl Into<String>) -> Self {
        self.criteria.insert(attribute.into(), None);
        self
    }

    /// Build a predicate from front-end options; empty strings mean "no filter"
    pub fn from_options<'a>(options: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let criteria = options
            .into_iter()
            .map(|(key, value)| {
                let criterion = (!value.is_empty())
                    .then(|| Criterion::Equals(Value::String(value.to_string())));
                (key.to_string(), criterion)
            })
            .collect();
        Self { criteria }
    }

    /// Criterion registered for `attribute`, if any
    pub fn get(&self, attribute: &str) -> Option<&Criterion> {
        self.criteria.get(attribute).and_then(Option::as_ref)
    }

    /// Constraining criteria only
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.criteria
            .iter()
            .filter_map(|(k, c)| c.as_ref().map(|c| (k.as_str(), c)))
    }

    /// Whether no key constrains anything
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether `lookup` satisfies every constraining criterion
    pub fn accepts<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<Value>,
    {
        self.iter().all(|(attribute, criterion)| {
            lookup(attribute).is_some_and(|actual| criterion.matches(&actual))
        })
    }
}

/// Keep the items whose attributes satisfy `predicate`, preserving order
pub fn filter<T, F>(items: Vec<T>, predicate: &FilterPredicate, accessor: F) -> Vec<T>
where
    F: Fn(&T, &str) -> Option<Value>,
{
    if predicate.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| predicate.accepts(|attribute| accessor(item, attribute)))
        .collect()
}

/// [`filter`] using the item's own [`Filterable`] accessor
pub fn filter_on<T: Filterable>(items: Vec<T>, predicate: &FilterPredicate) -> Vec<T> {
    filter(items, predicate, |item, attribute| item.attribute(attribute))
}
