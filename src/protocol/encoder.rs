//! Command encoder
//!
//! Builds RESP2 request frames.
//!
//! ## Wire Format
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<bytes>\r\n      (one segment per argument, keyword included)
//! ```
//!
//! Three ways to build a frame:
//! - `encode_static`: keyword plus a typed argument list, one buffer
//! - `CommandBuilder::new`: header written up front with a declared count
//! - `CommandBuilder::growing`: count tracked, header written by `finish()`

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{RespError, Result};

pub const CRLF: &[u8] = b"\r\n";

/// A typed command argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    /// Raw bytes with their explicit length
    Bytes(&'a [u8]),
    /// Signed 32-bit integer
    Int(i32),
    /// Signed 64-bit integer
    Long(i64),
    /// Floating point, rendered in fixed notation
    Double(f64),
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(b: &'a [u8]) -> Self {
        Arg::Bytes(b)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Arg<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        Arg::Bytes(b)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Bytes(s.as_bytes())
    }
}

impl<'a> From<&'a Bytes> for Arg<'a> {
    fn from(b: &'a Bytes) -> Self {
        Arg::Bytes(b)
    }
}

impl From<i32> for Arg<'_> {
    fn from(i: i32) -> Self {
        Arg::Int(i)
    }
}

impl From<i64> for Arg<'_> {
    fn from(i: i64) -> Self {
        Arg::Long(i)
    }
}

impl From<f64> for Arg<'_> {
    fn from(d: f64) -> Self {
        Arg::Double(d)
    }
}

// =============================================================================
// Static form
// =============================================================================

/// Encode `keyword` followed by `args` into one complete frame
pub fn encode_static(keyword: &str, args: &[Arg<'_>]) -> Bytes {
    let mut buf = BytesMut::with_capacity(16 + keyword.len() + args.len() * 16);
    put_count(&mut buf, b'*', args.len() + 1);
    put_bulk(&mut buf, keyword.as_bytes());
    for arg in args {
        put_arg(&mut buf, arg);
    }
    buf.freeze()
}

/// Encode a command given as raw byte strings, keyword first
pub fn encode_command<A: AsRef<[u8]>>(parts: &[A]) -> Bytes {
    let mut buf = BytesMut::with_capacity(16 + parts.len() * 16);
    put_count(&mut buf, b'*', parts.len());
    for part in parts {
        put_bulk(&mut buf, part.as_ref());
    }
    buf.freeze()
}

/// Inline form: words joined by spaces and terminated by CRLF
///
/// Binary-unsafe, only suitable for hand-typed commands.
pub fn encode_inline<A: AsRef<[u8]>>(parts: &[A]) -> Bytes {
    let mut buf = BytesMut::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            buf.put_u8(b' ');
        }
        buf.put_slice(part.as_ref());
    }
    buf.put_slice(CRLF);
    buf.freeze()
}

// =============================================================================
// Incremental and growth forms
// =============================================================================

/// Builder for variable-arity commands
#[derive(Debug)]
pub struct CommandBuilder {
    keyword: Bytes,
    /// Header + segments when the count is declared, segments only otherwise
    buf: BytesMut,
    /// Declared argument count (keyword excluded)
    declared: Option<usize>,
    /// Arguments appended so far (keyword excluded)
    argc: usize,
}

impl CommandBuilder {
    /// Start a command whose argument count is known up front
    pub fn new(keyword: &str, argc: usize) -> Self {
        let mut buf = BytesMut::with_capacity(32 + argc * 16);
        put_count(&mut buf, b'*', argc + 1);
        put_bulk(&mut buf, keyword.as_bytes());
        Self {
            keyword: Bytes::copy_from_slice(keyword.as_bytes()),
            buf,
            declared: Some(argc),
            argc: 0,
        }
    }

    /// Start a command whose argument count is only known once built
    pub fn growing(keyword: &str) -> Self {
        Self {
            keyword: Bytes::copy_from_slice(keyword.as_bytes()),
            buf: BytesMut::with_capacity(64),
            declared: None,
            argc: 0,
        }
    }

    pub fn arg<'a>(&mut self, arg: impl Into<Arg<'a>>) -> &mut Self {
        put_arg(&mut self.buf, &arg.into());
        self.argc += 1;
        self
    }

    pub fn append(&mut self, bytes: &[u8]) -> &mut Self {
        self.arg(Arg::Bytes(bytes))
    }

    pub fn append_int(&mut self, value: i32) -> &mut Self {
        self.arg(Arg::Int(value))
    }

    pub fn append_long(&mut self, value: i64) -> &mut Self {
        self.arg(Arg::Long(value))
    }

    pub fn append_double(&mut self, value: f64) -> &mut Self {
        self.arg(Arg::Double(value))
    }

    /// Arguments appended so far, keyword excluded
    pub fn argc(&self) -> usize {
        self.argc
    }

    pub fn keyword(&self) -> &[u8] {
        &self.keyword
    }

    /// Finalize the frame
    ///
    /// A builder with a declared count fails if a different number of
    /// arguments was appended, since the header is already written.
    pub fn finish(self) -> Result<Bytes> {
        match self.declared {
            Some(declared) if declared != self.argc => Err(RespError::Protocol(format!(
                "{} declared {} arguments but {} were appended",
                String::from_utf8_lossy(&self.keyword),
                declared,
                self.argc
            ))),
            Some(_) => Ok(self.buf.freeze()),
            None => {
                let mut out = BytesMut::with_capacity(32 + self.keyword.len() + self.buf.len());
                put_count(&mut out, b'*', self.argc + 1);
                put_bulk(&mut out, &self.keyword);
                out.put_slice(&self.buf);
                Ok(out.freeze())
            }
        }
    }
}

// =============================================================================
// Formatting helpers
// =============================================================================

/// Render a double in fixed notation with insignificant zeros trimmed
///
/// `3.0` → `3`, `3.14000` → `3.14`, `1e21` → `1000000000000000000000`.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    // Display for f64 is the shortest round-trip form and never uses an exponent
    let mut text = value.to_string();
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

fn put_count(buf: &mut BytesMut, tag: u8, count: usize) {
    let mut digits = itoa::Buffer::new();
    buf.put_u8(tag);
    buf.put_slice(digits.format(count).as_bytes());
    buf.put_slice(CRLF);
}

fn put_bulk(buf: &mut BytesMut, bytes: &[u8]) {
    put_count(buf, b'$', bytes.len());
    buf.put_slice(bytes);
    buf.put_slice(CRLF);
}

fn put_arg(buf: &mut BytesMut, arg: &Arg<'_>) {
    let mut digits = itoa::Buffer::new();
    match *arg {
        Arg::Bytes(bytes) => put_bulk(buf, bytes),
        Arg::Int(i) => put_bulk(buf, digits.format(i).as_bytes()),
        Arg::Long(l) => put_bulk(buf, digits.format(l).as_bytes()),
        Arg::Double(d) => put_bulk(buf, format_double(d).as_bytes()),
    }
}
