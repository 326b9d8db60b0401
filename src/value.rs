//! Value definitions
//!
//! `Value` is what the reply readers hand back to the caller: a scalar, an
//! ordered sequence, an ordered key/value mapping, a boolean, or null. It is
//! also what the value codecs serialize before a value goes on the wire.

use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::protocol::format_double;

/// A decoded reply value, or an application value to be serialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null bulk, null multibulk, or an explicit null
    Nil,

    /// Status replies, and `false` for recovered server errors
    Bool(bool),

    /// Integer replies that fit in an i64
    Int(i64),

    /// Double replies (scores, INCRBYFLOAT)
    Double(f64),

    /// Bulk payloads and raw text
    Bytes(Bytes),

    /// Multibulk replies
    Array(Vec<Value>),

    /// Zipped or parsed key/value replies, in order of first occurrence
    Map(#[serde(with = "map_as_pairs")] IndexMap<Bytes, Value>),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// `false` is how a recovered server error shows up
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<Bytes, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Lossy text rendering used to turn a value into bytes when no codec
    /// applies (map keys, the `None` serializer)
    pub fn to_text_bytes(&self) -> Bytes {
        match self {
            Value::Nil | Value::Bool(false) => Bytes::new(),
            Value::Bool(true) => Bytes::from_static(b"1"),
            Value::Int(i) => Bytes::from(i.to_string()),
            Value::Double(d) => Bytes::from(format_double(*d)),
            Value::Bytes(b) => b.clone(),
            Value::Array(_) | Value::Map(_) => Bytes::from_static(b"Array"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// JSON object keys must be strings, so maps travel as a sequence of pairs
mod map_as_pairs {
    use bytes::Bytes;
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Value;

    pub fn serialize<S: Serializer>(
        map: &IndexMap<Bytes, Value>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<Bytes, Value>, D::Error> {
        let pairs = Vec::<(Bytes, Value)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
