//! Reply Readers
//!
//! Typed readers that turn the next reply frame into a `Value`. Each command
//! knows the shape of its reply, so the caller names a `ReplyKind` and the
//! matching reader consumes exactly one frame.
//!
//! ## Responsibilities
//! - Record error replies as the connection's last error and yield `false`
//! - Raise the privileged server errors through the classifier
//! - Apply the connection's value codec to bulk payloads per unserialize policy
//! - Consume unexpected frames whole so the stream stays aligned
//!
//! ```text
//!   read_kind(kind)
//!        │
//!        ▼
//!   read_header()  ── ensure_live, top-level frames only
//!        │
//!        ▼
//!   read_with(kind, header)
//!        │
//!        ├── scalar.rs     status, integer, string, double, type, INFO...
//!        ├── multibulk.rs  arrays, zipped maps, HMGET, SCAN pages
//!        └── variant.rs    generic recursive reader
//! ```
//!
//! Frames nested inside an array (and replies drained from a batch) are read
//! with `next_header()`, which skips the liveness probe: reconnecting halfway
//! through a frame would splice two streams together.

mod multibulk;
mod scalar;
mod variant;

use bytes::Bytes;

use crate::error::Result;
use crate::network::Connection;
use crate::protocol::decoder::MAX_DEPTH;
use crate::protocol::Header;
use crate::value::Value;

pub use multibulk::ScanPage;

// =============================================================================
// Reply kinds
// =============================================================================

/// Which bulk payloads of a multibulk reply go through the value codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unserialize {
    None,
    /// Even positions
    Keys,
    /// Odd positions
    Values,
    All,
}

impl Unserialize {
    fn applies_to(&self, index: usize) -> bool {
        match self {
            Unserialize::None => false,
            Unserialize::Keys => index % 2 == 0,
            Unserialize::Values => index % 2 == 1,
            Unserialize::All => true,
        }
    }
}

/// How the value half of a zipped pair is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreDecode {
    /// Left as bytes, or unserialized when the policy covers values
    None,
    Int,
    Double,
}

/// Element layout of a SCAN-family page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// Key names, raw
    Scan,
    /// Set members, unserialized
    SScan,
    /// Member → score map
    ZScan,
    /// Field → value map
    HScan,
}

/// Session state changed by a command once the server acknowledges it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Select(i64),
    Auth(Bytes),
    /// WATCH (true) or UNWATCH (false)
    Watch(bool),
}

/// Reply shape expected for a command
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyKind {
    /// `+...` → true, with the session update applied on success
    Ack(Option<SessionUpdate>),
    /// `:1` → true, anything else false
    One,
    /// `:n` → integer, digits past i64 → text
    Integer,
    /// Bulk or status through the value codec
    String,
    /// Bulk or status, codec bypassed (PING, ECHO)
    RawString,
    /// Bulk text parsed as a double
    Double,
    /// TYPE status → key type code
    KeyType,
    /// INFO text → map
    Info,
    /// CLIENT LIST text → array of maps
    ClientList,
    /// DEBUG OBJECT status → map
    DebugObject,
    MultiBulk(Unserialize),
    Zipped(Unserialize, ScoreDecode),
    /// Elements paired with the given field names (HMGET)
    Assoc(Vec<Bytes>),
    Scan(ScanKind),
    /// Any shape, decoded recursively (EVAL, arbitrary commands)
    Variant,
}

/// Key type reported by TYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    NotFound,
    String,
    Set,
    List,
    ZSet,
    Hash,
}

impl KeyType {
    pub fn from_status(text: &[u8]) -> Self {
        match text {
            b"string" => KeyType::String,
            b"set" => KeyType::Set,
            b"list" => KeyType::List,
            b"zset" => KeyType::ZSet,
            b"hash" => KeyType::Hash,
            _ => KeyType::NotFound,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            KeyType::NotFound => 0,
            KeyType::String => 1,
            KeyType::Set => 2,
            KeyType::List => 3,
            KeyType::ZSet => 4,
            KeyType::Hash => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => KeyType::NotFound,
            1 => KeyType::String,
            2 => KeyType::Set,
            3 => KeyType::List,
            4 => KeyType::ZSet,
            5 => KeyType::Hash,
            _ => return None,
        })
    }
}

// =============================================================================
// Dispatch
// =============================================================================

impl Connection {
    /// Read the next top-level reply as `kind`
    pub fn read_kind(&mut self, kind: &ReplyKind) -> Result<Value> {
        let header = self.read_header()?;
        self.read_with(kind, header)
    }

    /// Read a reply whose header has already been consumed
    pub(crate) fn read_with(&mut self, kind: &ReplyKind, header: Header) -> Result<Value> {
        match kind {
            ReplyKind::Ack(update) => self.read_ack(header, update.as_ref()),
            ReplyKind::One => self.read_one(header),
            ReplyKind::Integer => self.read_integer(header),
            ReplyKind::String => self.read_string(header, true),
            ReplyKind::RawString => self.read_string(header, false),
            ReplyKind::Double => self.read_double(header),
            ReplyKind::KeyType => self.read_key_type(header),
            ReplyKind::Info => self.read_info(header),
            ReplyKind::ClientList => self.read_client_list(header),
            ReplyKind::DebugObject => self.read_debug_object(header),
            ReplyKind::MultiBulk(policy) => self.read_multibulk(header, *policy),
            ReplyKind::Zipped(policy, scores) => self.read_zipped(header, *policy, *scores),
            ReplyKind::Assoc(fields) => self.read_assoc(header, fields),
            ReplyKind::Scan(scan) => self.read_scan(header, *scan),
            ReplyKind::Variant => self.read_variant(header),
        }
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    /// Top-level error frame: remembered, then `false` unless privileged
    pub(crate) fn error_value(&mut self, payload: &[u8]) -> Result<Value> {
        self.server_error(payload)?;
        Ok(Value::Bool(false))
    }

    /// Error frame inside an array
    ///
    /// Raising leaves the rest of the array unread, so a privileged error
    /// here also fails the connection.
    pub(crate) fn nested_error_value(&mut self, payload: &[u8]) -> Result<Value> {
        match self.server_error(payload) {
            Ok(()) => Ok(Value::Bool(false)),
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    /// Consume the remainder of a frame the caller has no use for
    pub(crate) fn skip_frame(&mut self, header: Header) -> Result<()> {
        self.skip_frame_at(header, 0)
    }

    fn skip_frame_at(&mut self, header: Header, depth: usize) -> Result<()> {
        match header {
            Header::Bulk(Some(len)) => {
                self.read_bulk_body(len)?;
            }
            Header::Array(Some(count)) => {
                if depth >= MAX_DEPTH {
                    self.fail();
                    return Err(crate::error::RespError::Protocol(format!(
                        "array nesting deeper than {}",
                        MAX_DEPTH
                    )));
                }
                for _ in 0..count {
                    let next = self.next_header()?;
                    self.skip_frame_at(next, depth + 1)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Skip an unexpected frame and answer `false`; error frames are recorded
    pub(crate) fn unexpected(&mut self, header: Header) -> Result<Value> {
        tracing::debug!("Unexpected reply shape: {:?}", header);
        match header {
            Header::Error(payload) => self.error_value(&payload),
            other => {
                self.skip_frame(other)?;
                Ok(Value::Bool(false))
            }
        }
    }
}
