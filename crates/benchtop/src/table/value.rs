//! Cell values and their hashable keys.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Display format for datetime cells.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Missing value.
    Null,
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Date and time value.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Returns true for missing values (including NaN numbers).
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Numeric content, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    /// Text content, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Datetime content, if this is a datetime.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Kind of element stored, `None` for missing values.
    pub fn element_kind(&self) -> Option<ElementKind> {
        match self {
            _ if self.is_null() => None,
            Value::Number(_) => Some(ElementKind::Number),
            Value::Text(_) => Some(ElementKind::Text),
            Value::DateTime(_) => Some(ElementKind::DateTime),
            Value::Null => None,
        }
    }

    /// Key used for exact equality, hashing and ordering.
    pub fn key(&self) -> ValueKey {
        match self {
            _ if self.is_null() => ValueKey::Null,
            Value::Number(n) => {
                // -0.0 and 0.0 compare equal
                let n = if *n == 0.0 { 0.0 } else { *n };
                ValueKey::Number(n.to_bits())
            }
            Value::Text(s) => ValueKey::Text(s.clone()),
            Value::DateTime(dt) => ValueKey::DateTime(*dt),
            Value::Null => ValueKey::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            _ if self.is_null() => Ok(()),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Value::Null => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Format a number the shortest way that parses back to the same value.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Type of a non-missing cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Number,
    Text,
    DateTime,
}

/// Hashable, totally ordered form of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Null,
    Number(u64),
    Text(String),
    DateTime(NaiveDateTime),
}
