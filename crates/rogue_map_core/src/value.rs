//! Typed Tiled property values
//!
//! Tiled stores every custom property as a `(name, type, value)` triple. The
//! engine only interprets a handful of names; everything else is kept as a
//! [`PropertyValue`] so a loaded tileset still carries it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Tiled property value, tagged by its declared type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// `#AARRGGBB` or `#RRGGBB`, kept verbatim
    Color(String),
    /// Path relative to the declaring document
    File(String),
    /// Object id reference (0 = none)
    Object(u32),
    /// Custom class value with nested members
    Class(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Parse a raw XML attribute value according to its Tiled `type`
    ///
    /// A missing type means `string`. Returns `None` when the text does not
    /// parse as the declared type.
    pub fn from_typed(type_name: Option<&str>, raw: &str) -> Option<Self> {
        match type_name.unwrap_or("string") {
            "string" => Some(PropertyValue::String(raw.to_string())),
            "int" => raw.trim().parse().ok().map(PropertyValue::Int),
            "float" => raw.trim().parse().ok().map(PropertyValue::Float),
            "bool" => match raw.trim() {
                "true" | "1" => Some(PropertyValue::Bool(true)),
                "false" | "0" => Some(PropertyValue::Bool(false)),
                _ => None,
            },
            "color" => Some(PropertyValue::Color(raw.to_string())),
            "file" => Some(PropertyValue::File(raw.to_string())),
            "object" => raw.trim().parse().ok().map(PropertyValue::Object),
            // Class members are nested elements, filled in by the caller
            "class" => Some(PropertyValue::Class(BTreeMap::new())),
            _ => Some(PropertyValue::String(raw.to_string())),
        }
    }

    /// Convert a Tiled JSON `value` according to its declared `type`
    pub fn from_json(type_name: Option<&str>, json: &serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;

        match (type_name.unwrap_or("string"), json) {
            (_, Json::Null) => Some(PropertyValue::Null),
            ("bool", Json::Bool(b)) => Some(PropertyValue::Bool(*b)),
            ("int", Json::Number(n)) => n.as_i64().map(PropertyValue::Int),
            ("float", Json::Number(n)) => n.as_f64().map(PropertyValue::Float),
            ("object", Json::Number(n)) => n
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .map(PropertyValue::Object),
            ("color", Json::String(s)) => Some(PropertyValue::Color(s.clone())),
            ("file", Json::String(s)) => Some(PropertyValue::File(s.clone())),
            ("class", Json::Object(members)) => Some(PropertyValue::Class(
                members
                    .iter()
                    .filter_map(|(k, v)| Some((k.clone(), Self::from_untyped_json(v)?)))
                    .collect(),
            )),
            (_, Json::String(s)) => Some(PropertyValue::String(s.clone())),
            // Hand-written JSON often omits the type; fall back to the JSON shape
            (_, other) => Self::from_untyped_json(other),
        }
    }

    fn from_untyped_json(json: &serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Some(PropertyValue::Null),
            Json::Bool(b) => Some(PropertyValue::Bool(*b)),
            Json::Number(n) => n
                .as_i64()
                .map(PropertyValue::Int)
                .or_else(|| n.as_f64().map(PropertyValue::Float)),
            Json::String(s) => Some(PropertyValue::String(s.clone())),
            Json::Object(members) => Some(PropertyValue::Class(
                members
                    .iter()
                    .filter_map(|(k, v)| Some((k.clone(), Self::from_untyped_json(v)?)))
                    .collect(),
            )),
            Json::Array(_) => None,
        }
    }

    /// Get value as string reference (strings, colors and files)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) | PropertyValue::Color(s) | PropertyValue::File(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    /// Get value as float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f64),
            PropertyValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// The Tiled type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::String(_) => "string",
            PropertyValue::Color(_) => "color",
            PropertyValue::File(_) => "file",
            PropertyValue::Object(_) => "object",
            PropertyValue::Class(_) => "class",
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}
