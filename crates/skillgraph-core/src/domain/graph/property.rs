//! Property bags for nodes and edges
//!
//! Properties are stored as one JSON document per row. Values are limited to
//! a small tagged union of scalars and string lists so that every stored
//! document decodes back into the same shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ordered property mapping
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single property value
///
/// Serialized untagged, so a stored document reads as plain JSON
/// (`{"title": "A", "number": 42, "labels": ["bug"]}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Decode a JSON object into a property bag
///
/// Rejects non-objects and values outside the supported union (null,
/// nested objects, lists of non-strings) with `MalformedInput`.
pub fn properties_from_json(value: &serde_json::Value) -> Result<Properties> {
    if !value.is_object() {
        return Err(Error::MalformedInput(format!(
            "properties must be a JSON object, got {}",
            value
        )));
    }
    serde_json::from_value(value.clone())
        .map_err(|e| Error::MalformedInput(format!("unsupported property value: {}", e)))
}

/// Shallow-merge `partial` into `base`
///
/// New keys are added and existing keys overwritten; keys absent from
/// `partial` are left untouched. Returns the keys that were written.
pub fn merge_properties(base: &mut Properties, partial: Properties) -> Vec<String> {
    let keys = partial.keys().cloned().collect();
    base.extend(partial);
    keys
}
