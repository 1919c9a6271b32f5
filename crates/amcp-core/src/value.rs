//! Typed template values.
//!
//! Template parameters and component properties declare one of a fixed set
//! of value types. Assigning a value checks it against the declared type and
//! never coerces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a value does not fit its declared type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// A value of the wrong type was assigned.
    #[error("expected a value of type {expected}, got {found}")]
    TypeMismatch { expected: ValueType, found: ValueType },

    /// A declared type name is not one of the known value types.
    #[error("'{0}' is not a valid template value type (expected string, int, number or boolean)")]
    UnknownValueType(String),

    /// A value was assigned to an entry that was never defined.
    #[error("no entry named '{0}'")]
    UnknownEntry(String),
}

/// The value types a template can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ValueType {
    /// Returns the name used in template descriptors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "int",
            Self::Float => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ValueError;

    /// Parses a declared type name.
    ///
    /// Accepts the descriptor spellings (`string`, `int`, `number`,
    /// `boolean`) as well as `integer`, `float` and `bool`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "int" | "integer" => Ok(Self::Integer),
            "number" | "float" => Ok(Self::Float),
            "boolean" | "bool" => Ok(Self::Boolean),
            _ => Err(ValueError::UnknownValueType(s.to_string())),
        }
    }
}

/// A concrete template value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    /// Returns the runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::Boolean(_) => ValueType::Boolean,
        }
    }

    /// Checks that this value has the expected type.
    pub fn expect_type(&self, expected: ValueType) -> Result<(), ValueError> {
        let found = self.value_type();
        if found == expected {
            Ok(())
        } else {
            Err(ValueError::TypeMismatch { expected, found })
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
