//! Nested snapshot values.
//!
//! A snapshot is a tree of named branches whose leaves are integers, floats
//! or text. The variant kind matters to the delta engine: integer counters
//! get reset correction, floats do not, and everything else is compared
//! for equality only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered mapping of branch name to child value.
pub type ValueMap = BTreeMap<String, Value>;

/// One node of a snapshot tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Map(ValueMap),
}

impl Value {
    /// Creates an empty map node.
    pub fn empty_map() -> Self {
        Value::Map(ValueMap::new())
    }

    /// Returns the child at `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Returns the child at `key`, or `default` when absent or not a map.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Numeric view of a leaf. `None` for text and maps.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// True for numeric leaves that carry a nonzero value.
    pub fn is_nonzero_number(&self) -> bool {
        self.as_f64().is_some_and(|v| v != 0.0)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<ValueMap> for Value {
    fn from(m: ValueMap) -> Self {
        Value::Map(m)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
