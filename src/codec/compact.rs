//! Compact codec (bincode)
//!
//! A payload only counts as decoded when bincode consumes all of it, so
//! arbitrary strings that happen to start with a valid tag stay raw.

use bytes::Bytes;

use bincode::Options;

use crate::error::{RespError, Result};
use crate::value::Value;

/// Upper bound on what a single decode may allocate
const MAX_DECODE_SIZE: u64 = 512 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_DECODE_SIZE)
        .reject_trailing_bytes()
}

pub(super) fn encode(value: &Value) -> Result<Bytes> {
    options()
        .serialize(value)
        .map(Bytes::from)
        .map_err(|e| RespError::Serialization(e.to_string()))
}

pub(super) fn decode(raw: &[u8]) -> Result<Value> {
    options()
        .deserialize(raw)
        .map_err(|e| RespError::Serialization(e.to_string()))
}
