//! Unified value model for cross-platform cell and key comparison
//!
//! Origin extracts and destination tables come from different platforms with
//! different native type systems. Both are mapped into a single tagged
//! [`Value`] at the boundary so the comparison core never deals with
//! platform-specific typing.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single row: column name to value, in source column order.
pub type Row = IndexMap<String, Value>;

/// Tagged value variant covering every cell type the engine compares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

/// Timestamp formats accepted at the boundary, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

impl Value {
    /// Infer a typed value from a raw string.
    ///
    /// Used by row sources and the config boundary only, never by the
    /// comparator. An empty string stays `Text("")` - emptiness is not null.
    pub fn infer(raw: &str) -> Value {
        if raw.is_empty() {
            return Value::Text(String::new());
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
        if raw.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Some(ts) = Self::parse_timestamp(raw) {
            return Value::Timestamp(ts);
        }
        Value::Text(raw.to_string())
    }

    fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    /// Convert a JSON value into the engine's value model.
    ///
    /// Strings go through [`Value::infer`] so numeric and timestamp cells
    /// that one platform serialized as text still compare by value.
    /// Nested arrays/objects are flattened to their compact JSON text.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::infer(s),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's type family, used in log and report messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Timestamp(_) => "timestamp",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One normalized component of a row key.
///
/// Normalization happens at construction so equality, hashing, and ordering
/// all agree: integral floats collapse to integers (`5` keys the same record
/// as `5.0`), timestamps truncate to whole seconds, strings stay
/// byte-for-byte. `Float` only ever holds a non-integral value, which keeps
/// the derived `Eq`/`Hash` consistent with numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Timestamp(i64),
}

impl KeyPart {
    pub fn from_value(value: &Value) -> KeyPart {
        match value {
            Value::Null => KeyPart::Null,
            Value::Bool(b) => KeyPart::Bool(*b),
            Value::Int(i) => KeyPart::Int(*i),
            Value::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    KeyPart::Int(*f as i64)
                } else {
                    KeyPart::Float(f.to_bits())
                }
            }
            Value::Text(s) => KeyPart::Text(s.clone()),
            Value::Timestamp(ts) => KeyPart::Timestamp(ts.and_utc().timestamp()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyPart::Null => 0,
            KeyPart::Bool(_) => 1,
            KeyPart::Int(_) | KeyPart::Float(_) => 2,
            KeyPart::Text(_) => 3,
            KeyPart::Timestamp(_) => 4,
        }
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        use KeyPart::*;
        match (self, other) {
            (Int(a), Int(b)) => a.cmp(b),
            (Int(a), Float(b)) => (*a as f64).total_cmp(&f64::from_bits(*b)),
            (Float(a), Int(b)) => f64::from_bits(*a).total_cmp(&(*b as f64)),
            (Float(a), Float(b)) => f64::from_bits(*a).total_cmp(&f64::from_bits(*b)),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for KeyPart {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            KeyPart::Null => serializer.serialize_unit(),
            KeyPart::Bool(b) => serializer.serialize_bool(*b),
            KeyPart::Int(i) => serializer.serialize_i64(*i),
            KeyPart::Float(bits) => serializer.serialize_f64(f64::from_bits(*bits)),
            KeyPart::Text(s) => serializer.serialize_str(s),
            KeyPart::Timestamp(secs) => serializer.serialize_str(&format_unix_seconds(*secs)),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Null => write!(f, "NULL"),
            KeyPart::Bool(b) => write!(f, "{}", b),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            KeyPart::Text(s) => write!(f, "{}", s),
            KeyPart::Timestamp(secs) => write!(f, "{}", format_unix_seconds(*secs)),
        }
    }
}

fn format_unix_seconds(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc().to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Ordered tuple of normalized key parts identifying one logical record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(pub Vec<KeyPart>);

impl RowKey {
    /// Extract a key from a row at the declared key column positions.
    /// A key column absent from the row contributes a null part.
    pub fn extract(row: &Row, key_columns: &[String]) -> RowKey {
        RowKey(
            key_columns
                .iter()
                .map(|col| row.get(col).map(KeyPart::from_value).unwrap_or(KeyPart::Null))
                .collect(),
        )
    }
}

impl Serialize for RowKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.0.iter())
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}
