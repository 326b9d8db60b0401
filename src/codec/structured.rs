//! Structured codec (JSON)

use bytes::Bytes;

use crate::error::{RespError, Result};
use crate::value::Value;

pub(super) fn encode(value: &Value) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| RespError::Serialization(e.to_string()))
}

pub(super) fn decode(raw: &[u8]) -> Result<Value> {
    serde_json::from_slice(raw).map_err(|e| RespError::Serialization(e.to_string()))
}
