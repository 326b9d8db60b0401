//! Reply frame definitions
//!
//! A `Reply` is one decoded RESP2 frame, produced fresh per read and never
//! stored on the connection.

use bytes::Bytes;

/// One decoded RESP2 frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK`
    Status(Bytes),

    /// `-ERR message`
    Error(ErrorReply),

    /// `:1000`
    Integer(i64),

    /// `:<digits>` outside the i64 range, kept as its decimal text
    IntegerText(Bytes),

    /// `$<n>` followed by n bytes
    Bulk(Bytes),

    /// `$-1`
    NullBulk,

    /// `*<n>` followed by n frames
    Array(Vec<Reply>),

    /// `*-1`
    NullArray,
}

impl Reply {
    pub fn is_null(&self) -> bool {
        matches!(self, Reply::NullBulk | Reply::NullArray)
    }
}

/// Payload of an error line, split into its code and message
///
/// `-ERR unknown command` has code `ERR` and message `unknown command`. An
/// error line whose first word is not an upper-case code has an empty code
/// and the whole line as its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReply {
    line: Bytes,
    code_len: usize,
}

impl ErrorReply {
    pub fn new(line: Bytes) -> Self {
        let word = line.iter().position(|&b| b == b' ').unwrap_or(line.len());
        let is_code = word > 0
            && line[..word]
                .iter()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || *b == b'_');
        let code_len = if is_code { word } else { 0 };
        Self { line, code_len }
    }

    /// Leading error code, e.g. `ERR`, `WRONGTYPE`, `LOADING`
    pub fn code(&self) -> &[u8] {
        &self.line[..self.code_len]
    }

    /// Text after the code
    pub fn message(&self) -> &[u8] {
        let rest = &self.line[self.code_len..];
        rest.strip_prefix(b" ").unwrap_or(rest)
    }

    /// The full error line without the leading `-`
    pub fn line(&self) -> &Bytes {
        &self.line
    }
}
