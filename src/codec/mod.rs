//! Value Codec Module
//!
//! Turns application values into the bytes sent as value-bearing arguments,
//! and bulk replies back into values.
//!
//! ## Strategies
//! - `None`: bytes pass through, other values are stringified; decode is a no-op
//! - `Structured`: JSON, round-trips nested arrays and maps
//! - `Compact`: bincode, same contract in a denser binary form
//!
//! Decoding never fails outward: if the payload does not parse under the
//! selected strategy the raw bytes are handed back unchanged.

mod compact;
mod structured;

use bytes::Bytes;

use crate::error::Result;
use crate::value::Value;

/// Serializer selected once per connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Serializer {
    #[default]
    None,
    Structured,
    Compact,
}

impl Serializer {
    /// Encode a value for sending
    pub fn serialize(&self, value: &Value) -> Result<Bytes> {
        match self {
            Serializer::None => Ok(value.to_text_bytes()),
            Serializer::Structured => structured::encode(value),
            Serializer::Compact => compact::encode(value),
        }
    }

    /// Decode a payload, reporting failure
    ///
    /// `None` never decodes and returns the payload as `Value::Bytes`.
    pub fn try_unserialize(&self, raw: &[u8]) -> Result<Value> {
        match self {
            Serializer::None => Ok(Value::Bytes(Bytes::copy_from_slice(raw))),
            Serializer::Structured => structured::decode(raw),
            Serializer::Compact => compact::decode(raw),
        }
    }

    /// Decode a payload, falling back to the raw bytes
    pub fn unserialize(&self, raw: Bytes) -> Value {
        if *self == Serializer::None {
            return Value::Bytes(raw);
        }
        match self.try_unserialize(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::trace!("{:?} decode failed, passing raw bytes through: {}", self, e);
                Value::Bytes(raw)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Serializer::None => "none",
            Serializer::Structured => "structured",
            Serializer::Compact => "compact",
        }
    }
}
