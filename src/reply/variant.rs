//! Generic recursive reader
//!
//! Used when the reply shape is not known ahead of time (EVAL, arbitrary
//! commands). Bulk payloads are returned raw, status lines become `true`.

use crate::error::{RespError, Result};
use crate::network::Connection;
use crate::protocol::decoder::MAX_DEPTH;
use crate::protocol::Header;
use crate::value::Value;

impl Connection {
    pub(crate) fn read_variant(&mut self, header: Header) -> Result<Value> {
        self.read_variant_at(header, 0)
    }

    pub(crate) fn read_variant_at(&mut self, header: Header, depth: usize) -> Result<Value> {
        match header {
            Header::Status(_) => Ok(Value::Bool(true)),
            Header::Error(payload) if depth == 0 => self.error_value(&payload),
            Header::Error(payload) => self.nested_error_value(&payload),
            Header::Integer(n) => Ok(Value::Int(n)),
            Header::IntegerText(text) => Ok(Value::Bytes(text)),
            Header::Bulk(Some(len)) => Ok(Value::Bytes(self.read_bulk_body(len)?)),
            Header::Bulk(None) | Header::Array(None) => Ok(Value::Nil),
            Header::Array(Some(count)) => {
                if depth >= MAX_DEPTH {
                    self.fail();
                    return Err(RespError::Protocol(format!(
                        "array nesting deeper than {}",
                        MAX_DEPTH
                    )));
                }
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    let next = self.next_header()?;
                    items.push(self.read_variant_at(next, depth + 1)?);
                }
                Ok(Value::Array(items))
            }
        }
    }
}
