//! Reply decoder
//!
//! Frame-level RESP2 decoding over any `BufRead`. The first byte of a line
//! selects the type:
//!
//! ```text
//! +<text>        status
//! -<text>        error
//! :<digits>      integer
//! $<n>           bulk header, n bytes + CRLF follow ($-1 = null)
//! *<n>           array header, n frames follow (*-1 = null)
//! ```
//!
//! These functions never classify errors or apply a value codec; that
//! happens in the connection's reply readers.

use std::io::BufRead;
use std::num::IntErrorKind;

use bytes::Bytes;

use crate::error::{RespError, Result};

use super::{ErrorReply, Reply};

/// Largest bulk payload accepted (matches the server's proto-max-bulk-len)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Deepest array nesting accepted by the recursive readers
pub const MAX_DEPTH: usize = 512;

/// The type-tagged first line of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Status(Bytes),
    Error(Bytes),
    Integer(i64),
    /// Integer line outside the i64 range
    IntegerText(Bytes),
    /// Bulk length, `None` for `$-1`
    Bulk(Option<usize>),
    /// Element count, `None` for `*-1`
    Array(Option<usize>),
}

/// Read one CRLF-terminated line into `buf`, without the terminator
pub fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<()> {
    buf.clear();
    let read = reader.read_until(b'\n', buf)?;
    if read == 0 {
        return Err(RespError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed by server",
        )));
    }
    if buf.len() < 2 || buf[buf.len() - 2] != b'\r' || buf[buf.len() - 1] != b'\n' {
        return Err(RespError::Protocol("line not terminated by CRLF".to_string()));
    }
    buf.truncate(buf.len() - 2);
    Ok(())
}

/// Read the type-tagged line that starts a frame
pub fn read_header<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<Header> {
    read_line(reader, buf)?;
    let Some((&tag, rest)) = buf.split_first() else {
        return Err(RespError::Protocol("empty reply line".to_string()));
    };

    let header = match tag {
        b'+' => Header::Status(Bytes::copy_from_slice(rest)),
        b'-' => Header::Error(Bytes::copy_from_slice(rest)),
        b':' => match parse_integer(rest)? {
            Some(value) => Header::Integer(value),
            None => Header::IntegerText(Bytes::copy_from_slice(rest)),
        },
        b'$' => {
            let len = parse_length(rest)?;
            if let Some(n) = len {
                if n > MAX_BULK_LEN {
                    return Err(RespError::Protocol(format!(
                        "bulk length {} exceeds maximum {}",
                        n, MAX_BULK_LEN
                    )));
                }
            }
            Header::Bulk(len)
        }
        b'*' => Header::Array(parse_length(rest)?),
        other => return Err(RespError::unexpected_byte(other)),
    };

    tracing::trace!("reply header: {:?}", header);
    Ok(header)
}

/// Read a bulk payload of exactly `len` bytes plus its CRLF terminator
pub fn read_bulk_body<R: BufRead>(reader: &mut R, len: usize) -> Result<Bytes> {
    let mut data = vec![0u8; len + 2];
    reader.read_exact(&mut data)?;
    if &data[len..] != b"\r\n" {
        return Err(RespError::Protocol(
            "bulk payload not terminated by CRLF".to_string(),
        ));
    }
    data.truncate(len);
    Ok(Bytes::from(data))
}

/// Read one complete frame, recursing into arrays
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let mut line = Vec::with_capacity(64);
    read_reply_at(reader, &mut line, 0)
}

fn read_reply_at<R: BufRead>(reader: &mut R, line: &mut Vec<u8>, depth: usize) -> Result<Reply> {
    let reply = match read_header(reader, line)? {
        Header::Status(text) => Reply::Status(text),
        Header::Error(text) => Reply::Error(ErrorReply::new(text)),
        Header::Integer(value) => Reply::Integer(value),
        Header::IntegerText(text) => Reply::IntegerText(text),
        Header::Bulk(None) => Reply::NullBulk,
        Header::Bulk(Some(len)) => Reply::Bulk(read_bulk_body(reader, len)?),
        Header::Array(None) => Reply::NullArray,
        Header::Array(Some(count)) => {
            if depth >= MAX_DEPTH {
                return Err(RespError::Protocol(format!(
                    "array nesting deeper than {}",
                    MAX_DEPTH
                )));
            }
            let mut items = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                items.push(read_reply_at(reader, line, depth + 1)?);
            }
            Reply::Array(items)
        }
    };
    Ok(reply)
}

/// Parse the digits of an integer line
///
/// Returns `None` when the digits are well formed but do not fit in an i64,
/// so the caller can surface the original text instead of a truncated value.
pub fn parse_integer(digits: &[u8]) -> Result<Option<i64>> {
    let text = std::str::from_utf8(digits)
        .map_err(|_| RespError::Protocol("integer reply is not ASCII".to_string()))?;
    match text.parse::<i64>() {
        Ok(value) => Ok(Some(value)),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            Ok(None)
        }
        Err(_) => Err(RespError::Protocol(format!(
            "invalid integer reply '{}'",
            text.escape_default()
        ))),
    }
}

/// Parse a bulk or array length; `-1` is the null sentinel
fn parse_length(digits: &[u8]) -> Result<Option<usize>> {
    match parse_integer(digits)? {
        Some(-1) => Ok(None),
        Some(n) if n >= 0 => Ok(Some(n as usize)),
        _ => Err(RespError::Protocol(format!(
            "invalid length '{}'",
            String::from_utf8_lossy(digits)
        ))),
    }
}
