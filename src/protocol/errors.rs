//! Error classifier
//!
//! Most error replies are recoverable: the text is remembered as the
//! connection's last error and the command yields `false`. Three categories
//! are raised instead, because retrying against the same server cannot help.

use crate::error::{FatalKind, RespError, Result};

/// Replica syncing with its master, or link to master down
pub const MASTERDOWN_KW: &[u8] = b"MASTERDOWN";

/// Dataset loading in progress
pub const LOADING_KW: &[u8] = b"LOADING";

/// Authentication required or failed
pub const NOAUTH_KW: &[u8] = b"NOAUTH";

/// Match the leading keyword of an error payload against the privileged set
///
/// Comparison is case- and length-exact on the first space-delimited word,
/// so `LOADING` and `LOADING Redis is loading...` match but `LOADINGX` and
/// `loading` do not.
pub fn classify(payload: &[u8]) -> Option<FatalKind> {
    let word_end = payload.iter().position(|&b| b == b' ').unwrap_or(payload.len());
    match &payload[..word_end] {
        MASTERDOWN_KW => Some(FatalKind::MasterDown),
        LOADING_KW => Some(FatalKind::Loading),
        NOAUTH_KW => Some(FatalKind::NoAuth),
        _ => None,
    }
}

/// Raise `ServerFatal` for privileged errors, pass everything else
pub fn check(payload: &[u8]) -> Result<()> {
    match classify(payload) {
        Some(kind) => Err(RespError::ServerFatal {
            kind,
            message: String::from_utf8_lossy(payload).into_owned(),
        }),
        None => Ok(()),
    }
}
