//! # resplink
//!
//! A synchronous client-side engine for the Redis RESP2 protocol:
//! - Command encoding with typed arguments
//! - Reply decoding into typed values, with per-command reply shapes
//! - Connection management with end-of-file detection, jittered reconnect
//!   and AUTH/SELECT replay
//! - Pluggable value codecs and key prefixing
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Client                              │
//! │        (typed commands, MULTI / pipeline batching)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  prefix keys, serialize values
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Encoder   │          │   Readers   │
//!   │ (*N $len..) │          │ (ReplyKind) │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │  classify errors, unserialize
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │             Connection              │
//!   │  (ensure_live, reconnect, replay)   │
//!   └─────────────────┬───────────────────┘
//!                     │
//!                     ▼
//!              TCP / unix socket
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod codec;
pub mod prefix;
pub mod protocol;
pub mod network;
pub mod reply;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use codec::Serializer;
pub use config::Config;
pub use error::{FatalKind, RespError, Result};
pub use network::{Connection, Mode, Status};
pub use reply::{KeyType, ReplyKind, ScanPage};
pub use value::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of resplink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
