//! Attribute storage for model instances.

use crate::models::Value;
use crate::schema::Field;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Attribute name -> value map backing a model instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Value of `attribute`, `Null` when unset.
    pub fn value(&self, attribute: &str) -> Value {
        self.values.get(attribute).cloned().unwrap_or_default()
    }

    /// Set `attribute`, returning the previous value.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(attribute.into(), value.into())
    }

    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.values.remove(attribute)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.values.contains_key(attribute)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }

    /// Value of `attribute`, falling back to the field default when unset or null.
    ///
    /// A resolved default is stored on the record, so a computed default runs
    /// at most once per instance.
    pub fn value_or_default(&mut self, attribute: &str, field: &Field) -> Value {
        if let Some(value) = self.values.get(attribute).filter(|v| !v.is_null()) {
            return value.clone();
        }
        let Some(default) = field.default() else {
            return Value::Null;
        };

        let value = default.resolve();
        debug!("using default value for {}: {}", attribute, value);
        self.values.insert(attribute.to_string(), value.clone());
        value
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
