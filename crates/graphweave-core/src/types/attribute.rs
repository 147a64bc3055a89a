//! Attribute values attached to nodes, edges and mentions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute map. Ordered by key so exports are reproducible.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Convert a JSON value into a scalar.
    ///
    /// Returns `None` for nulls, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// An attribute value: one scalar, or an ordered list of scalars.
///
/// Lists appear either because the mention supplied one (e.g. `tags`) or
/// because two mentions disagreed on a scalar and both values were kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl AttributeValue {
    /// Convert a JSON value into an attribute value.
    ///
    /// Nulls yield `None`. Nested objects, and objects inside arrays, are kept
    /// as their compact JSON text so no information is dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::Null => {}
                        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                            push_distinct(&mut list, Scalar::Text(item.to_string()))
                        }
                        other => {
                            if let Some(s) = Scalar::from_json(other) {
                                push_distinct(&mut list, s);
                            }
                        }
                    }
                }
                Some(Self::List(list))
            }
            serde_json::Value::Object(_) => Some(Self::Scalar(Scalar::Text(value.to_string()))),
            other => Scalar::from_json(other).map(Self::Scalar),
        }
    }

    /// All scalars of this value in order.
    pub fn values(&self) -> &[Scalar] {
        match self {
            Self::Scalar(s) => std::slice::from_ref(s),
            Self::List(items) => items,
        }
    }

    /// Check whether this value holds the given scalar.
    pub fn contains(&self, scalar: &Scalar) -> bool {
        self.values().contains(scalar)
    }

    /// Merge an incoming value into this one without losing information.
    ///
    /// Incoming scalars not already present are appended in encounter order and
    /// the value becomes a list. Returns `true` if anything changed. Merging a
    /// value that is already fully contained is a no-op, which keeps record
    /// re-processing idempotent.
    pub fn merge(&mut self, incoming: &AttributeValue) -> bool {
        let fresh: Vec<&Scalar> = incoming
            .values()
            .iter()
            .filter(|s| !self.contains(s))
            .collect();
        if fresh.is_empty() {
            return false;
        }

        let mut merged = self.values().to_vec();
        for scalar in fresh {
            push_distinct(&mut merged, scalar.clone());
        }
        *self = Self::List(merged);
        true
    }

    /// Render the value for display, joining list items with `", "`.
    pub fn display_joined(&self) -> String {
        self.values()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Scalar> for AttributeValue {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        Self::Scalar(i.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(x: f64) -> Self {
        Self::Scalar(x.into())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Scalar(b.into())
    }
}

fn push_distinct(list: &mut Vec<Scalar>, scalar: Scalar) {
    if !list.contains(&scalar) {
        list.push(scalar);
    }
}

/// Convert a JSON object into an attribute map.
///
/// Non-object values produce an empty map.
pub fn attributes_from_json(value: &serde_json::Value) -> Attributes {
    let mut attributes = Attributes::new();
    if let serde_json::Value::Object(map) = value {
        for (key, v) in map {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            if let Some(attr) = AttributeValue::from_json(v) {
                attributes.insert(key.to_string(), attr);
            }
        }
    }
    attributes
}
