//! Identity types for records held by the remote store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// A row as returned by the remote store: column name to JSON value.
///
/// The data-access layer never interprets record shape beyond the
/// identifier field and whatever columns a caller filters on.
pub type Record = serde_json::Map<String, Value>;

/// Column that identifies a record unless configured otherwise.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Primary key of a record.
///
/// Remote tables key rows either by integer sequences or by text/UUID
/// columns, so both shapes are carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Text(String),
}

impl Identifier {
    /// Convert to the JSON value used in payloads and filters.
    pub fn to_value(&self) -> Value {
        match self {
            Identifier::Int(n) => Value::from(*n),
            Identifier::Text(s) => Value::String(s.clone()),
        }
    }

    /// Read an identifier out of a JSON value.
    ///
    /// Returns `None` for nulls, floats, booleans and nested values.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Identifier::Int),
            Value::String(s) => Some(Identifier::Text(s.clone())),
            _ => None,
        }
    }

    /// Extract the identifier of a record using the given id column.
    pub fn of(record: &Record, id_field: &str) -> Option<Self> {
        record.get(id_field).and_then(Identifier::from_value)
    }

    /// Check whether a JSON value refers to this identifier.
    ///
    /// Integer ids also match their decimal string form, since stores
    /// commonly echo numeric keys back as text.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Identifier::Int(n), Value::Number(v)) => v.as_i64() == Some(*n),
            (Identifier::Int(n), Value::String(s)) => s.parse::<i64>().ok() == Some(*n),
            (Identifier::Text(s), Value::String(v)) => s == v,
            _ => false,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(n) => write!(f, "{}", n),
            Identifier::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Int(n)
    }
}

impl From<i32> for Identifier {
    fn from(n: i32) -> Self {
        Identifier::Int(i64::from(n))
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Text(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::Text(s)
    }
}
