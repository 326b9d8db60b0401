//! Multibulk readers
//!
//! Arrays of scalars, optionally zipped into a map (`HGETALL`, `ZRANGE ...
//! WITHSCORES`, `CONFIG GET`), paired with caller-supplied fields (`HMGET`),
//! or wrapped in a SCAN page (`*2`, cursor, elements).

use bytes::Bytes;
use indexmap::IndexMap;

use crate::error::Result;
use crate::network::Connection;
use crate::protocol::decoder::parse_integer;
use crate::protocol::Header;
use crate::value::Value;

use super::scalar::parse_double;
use super::{ScanKind, ScoreDecode, Unserialize};

/// One page of a SCAN-family iteration
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage {
    /// Cursor for the next call; 0 when the iteration is complete
    pub cursor: u64,
    /// Keys, members, or a field/score map depending on the command
    pub items: Value,
}

impl ScanPage {
    /// Split a scan reply value into cursor and items
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Array(mut parts) = value else {
            return None;
        };
        if parts.len() != 2 {
            return None;
        }
        let items = parts.pop()?;
        let cursor = match parts.pop()? {
            Value::Bytes(text) => std::str::from_utf8(&text).ok()?.parse().ok()?,
            Value::Int(n) => u64::try_from(n).ok()?,
            _ => return None,
        };
        Some(Self { cursor, items })
    }

    pub fn is_last(&self) -> bool {
        self.cursor == 0
    }
}

impl Connection {
    /// `*n` of scalars, codec applied per position
    pub(crate) fn read_multibulk(&mut self, header: Header, policy: Unserialize) -> Result<Value> {
        match header {
            Header::Array(Some(count)) => {
                let mut items = Vec::with_capacity(count.min(1024));
                for index in 0..count {
                    let next = self.next_header()?;
                    items.push(self.read_element(next, policy.applies_to(index))?);
                }
                Ok(Value::Array(items))
            }
            Header::Array(None) => Ok(Value::Nil),
            other => self.unexpected(other),
        }
    }

    /// `*2n` of alternating key/value elements → ordered map
    ///
    /// A trailing unpaired element is dropped.
    pub(crate) fn read_zipped(
        &mut self,
        header: Header,
        policy: Unserialize,
        scores: ScoreDecode,
    ) -> Result<Value> {
        let count = match header {
            Header::Array(Some(count)) => count,
            Header::Array(None) => return Ok(Value::Nil),
            other => return self.unexpected(other),
        };

        let mut raw = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let next = self.next_header()?;
            raw.push(self.read_element(next, false)?);
        }

        let serializer = self.serializer();
        let mut map = IndexMap::with_capacity(raw.len() / 2);
        let mut elements = raw.into_iter();
        while let (Some(key), Some(value)) = (elements.next(), elements.next()) {
            let key = match key {
                Value::Bytes(bytes) if policy.applies_to(0) => {
                    serializer.unserialize(bytes).to_text_bytes()
                }
                other => other.to_text_bytes(),
            };
            let value = match (value, scores) {
                (Value::Bytes(bytes), ScoreDecode::Int) => match parse_integer(&bytes) {
                    Ok(Some(n)) => Value::Int(n),
                    _ => Value::Bytes(bytes),
                },
                (Value::Bytes(bytes), ScoreDecode::Double) => match parse_double(&bytes) {
                    Some(d) => Value::Double(d),
                    None => Value::Bytes(bytes),
                },
                (Value::Bytes(bytes), ScoreDecode::None) if policy.applies_to(1) => {
                    serializer.unserialize(bytes)
                }
                (other, _) => other,
            };
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    /// `*n` paired position-by-position with the requested fields
    pub(crate) fn read_assoc(&mut self, header: Header, fields: &[Bytes]) -> Result<Value> {
        let count = match header {
            Header::Array(Some(count)) => count,
            Header::Array(None) => return Ok(Value::Nil),
            other => return self.unexpected(other),
        };

        let mut map = IndexMap::with_capacity(fields.len());
        for index in 0..count {
            let next = self.next_header()?;
            let value = self.read_element(next, true)?;
            if let Some(field) = fields.get(index) {
                map.insert(field.clone(), value);
            }
        }
        Ok(Value::Map(map))
    }

    /// `*2`: cursor bulk, then the element array for `kind`
    ///
    /// Yields `[cursor, items]`; see [`ScanPage::from_value`].
    pub(crate) fn read_scan(&mut self, header: Header, kind: ScanKind) -> Result<Value> {
        match header {
            Header::Array(Some(2)) => {}
            other => return self.unexpected(other),
        }

        let cursor = match self.next_header()? {
            Header::Bulk(Some(len)) => self.read_bulk_body(len)?,
            Header::Integer(n) => Bytes::from(n.to_string()),
            other => {
                self.skip_frame(other)?;
                let rest = self.next_header()?;
                self.skip_frame(rest)?;
                return Ok(Value::Bool(false));
            }
        };

        let next = self.next_header()?;
        let items = match kind {
            ScanKind::Scan => self.read_multibulk(next, Unserialize::None)?,
            ScanKind::SScan => self.read_multibulk(next, Unserialize::All)?,
            ScanKind::ZScan => self.read_zipped(next, Unserialize::Keys, ScoreDecode::Double)?,
            ScanKind::HScan => self.read_zipped(next, Unserialize::Values, ScoreDecode::None)?,
        };
        Ok(Value::Array(vec![Value::Bytes(cursor), items]))
    }

    /// One element of an array
    fn read_element(&mut self, header: Header, decode: bool) -> Result<Value> {
        match header {
            Header::Bulk(Some(len)) => {
                let body = self.read_bulk_body(len)?;
                if decode {
                    Ok(self.serializer().unserialize(body))
                } else {
                    Ok(Value::Bytes(body))
                }
            }
            Header::Bulk(None) => Ok(Value::Nil),
            Header::Status(text) => Ok(Value::Bytes(text)),
            Header::Integer(n) => Ok(Value::Int(n)),
            Header::IntegerText(text) => Ok(Value::Bytes(text)),
            Header::Error(payload) => self.nested_error_value(&payload),
            nested @ Header::Array(_) => self.read_variant_at(nested, 1),
        }
    }
}
