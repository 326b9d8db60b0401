//! Fixed-shape readers for single-frame replies

use bytes::Bytes;

use crate::error::Result;
use crate::network::Connection;
use crate::protocol::scanner::{scan_client_list, scan_debug_object, scan_info};
use crate::protocol::Header;
use crate::value::Value;

use super::{KeyType, SessionUpdate};

impl Connection {
    /// `+anything` → true
    pub(crate) fn read_ack(
        &mut self,
        header: Header,
        update: Option<&SessionUpdate>,
    ) -> Result<Value> {
        match header {
            Header::Status(_) => {
                match update {
                    Some(SessionUpdate::Select(db)) => self.set_database(*db),
                    Some(SessionUpdate::Auth(password)) => self.set_auth(password.clone()),
                    Some(SessionUpdate::Watch(watching)) => self.set_watching(*watching),
                    None => {}
                }
                Ok(Value::Bool(true))
            }
            other => self.unexpected(other),
        }
    }

    /// `:1` → true, any other integer → false
    pub(crate) fn read_one(&mut self, header: Header) -> Result<Value> {
        match header {
            Header::Integer(n) => Ok(Value::Bool(n == 1)),
            Header::IntegerText(_) => Ok(Value::Bool(false)),
            other => self.unexpected(other),
        }
    }

    pub(crate) fn read_integer(&mut self, header: Header) -> Result<Value> {
        match header {
            Header::Integer(n) => Ok(Value::Int(n)),
            Header::IntegerText(text) => Ok(Value::Bytes(text)),
            other => self.unexpected(other),
        }
    }

    /// Bulk payload, through the value codec when `decode` is set
    ///
    /// Status and integer lines are handed back as they are.
    pub(crate) fn read_string(&mut self, header: Header, decode: bool) -> Result<Value> {
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
            other => self.unexpected(other),
        }
    }

    pub(crate) fn read_double(&mut self, header: Header) -> Result<Value> {
        match header {
            Header::Bulk(Some(len)) => {
                let body = self.read_bulk_body(len)?;
                Ok(parse_double(&body).map_or(Value::Bool(false), Value::Double))
            }
            Header::Bulk(None) => Ok(Value::Nil),
            Header::Status(text) => Ok(parse_double(&text).map_or(Value::Bool(false), Value::Double)),
            Header::Integer(n) => Ok(Value::Double(n as f64)),
            other => self.unexpected(other),
        }
    }

    /// TYPE status → `KeyType` code
    pub(crate) fn read_key_type(&mut self, header: Header) -> Result<Value> {
        match header {
            Header::Status(text) => Ok(Value::Int(KeyType::from_status(&text).code())),
            other => self.unexpected(other),
        }
    }

    pub(crate) fn read_info(&mut self, header: Header) -> Result<Value> {
        match self.text_payload(header)? {
            Ok(text) => Ok(Value::Map(scan_info(&text))),
            Err(value) => Ok(value),
        }
    }

    pub(crate) fn read_client_list(&mut self, header: Header) -> Result<Value> {
        match self.text_payload(header)? {
            Ok(text) => Ok(Value::Array(
                scan_client_list(&text).into_iter().map(Value::Map).collect(),
            )),
            Err(value) => Ok(value),
        }
    }

    pub(crate) fn read_debug_object(&mut self, header: Header) -> Result<Value> {
        match self.text_payload(header)? {
            Ok(text) => Ok(Value::Map(scan_debug_object(&text))),
            Err(value) => Ok(value),
        }
    }

    /// Text of a status or bulk reply, or the value to return instead
    fn text_payload(&mut self, header: Header) -> Result<std::result::Result<Bytes, Value>> {
        match header {
            Header::Status(text) => Ok(Ok(text)),
            Header::Bulk(Some(len)) => Ok(Ok(self.read_bulk_body(len)?)),
            Header::Bulk(None) => Ok(Err(Value::Nil)),
            other => self.unexpected(other).map(Err),
        }
    }
}

pub(crate) fn parse_double(text: &[u8]) -> Option<f64> {
    std::str::from_utf8(text).ok()?.trim().parse().ok()
}
