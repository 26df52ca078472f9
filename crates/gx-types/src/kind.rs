//! Structural inspection of JSON values.
//!
//! Everything the store persists is JSON, so these helpers classify
//! [`serde_json::Value`]s rather than arbitrary Rust types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// The structural kind of a JSON value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Canonical name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean => "Boolean",
            Self::Number => "Number",
            Self::String => "String",
            Self::Array => "Array",
            Self::Object => "Object",
        }
    }

    /// Returns `true` for the non-container kinds.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Array | Self::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "null" => Ok(Self::Null),
            "boolean" | "bool" => Ok(Self::Boolean),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            _ => Err(TypeError::UnknownKind(s.to_string())),
        }
    }
}

/// Name the type of a value.
///
/// Without `detailed`, primitives are reported by kind and every container
/// collapses to `"Object"`. With `detailed`, arrays report `"Array"` and
/// numbers are refined into `"Integer"` or `"Float"`.
pub fn get_type(value: &Value, detailed: bool) -> &'static str {
    let kind = ValueKind::of(value);
    if !detailed {
        return if kind.is_primitive() { kind.name() } else { "Object" };
    }
    match value {
        Value::Number(n) if n.is_f64() => "Float",
        Value::Number(_) => "Integer",
        _ => kind.name(),
    }
}

pub fn is_null(value: &Value) -> bool {
    ValueKind::of(value) == ValueKind::Null
}

pub fn is_boolean(value: &Value) -> bool {
    ValueKind::of(value) == ValueKind::Boolean
}

pub fn is_number(value: &Value) -> bool {
    ValueKind::of(value) == ValueKind::Number
}

pub fn is_string(value: &Value) -> bool {
    ValueKind::of(value) == ValueKind::String
}

pub fn is_array(value: &Value) -> bool {
    ValueKind::of(value) == ValueKind::Array
}

/// Returns `true` only for JSON objects; arrays are not objects here.
pub fn is_object(value: &Value) -> bool {
    ValueKind::of(value) == ValueKind::Object
}
