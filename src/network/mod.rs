//! Network Module
//!
//! Client-side socket handling.
//!
//! ## Responsibilities
//! - Open TCP or unix-domain streams with connect/read timeouts
//! - Detect a server-closed stream before each read and write
//! - Reconnect with jittered backoff and replay AUTH/SELECT
//! - Track transaction, pipeline and WATCH state that governs recovery

mod backoff;
mod connection;
mod stream;

pub use backoff::Backoff;
pub use connection::{Connection, ConnectionStats, Mode, Status};
pub use stream::{probe_eof, Stream};
