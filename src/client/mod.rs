//! Client Module
//!
//! Command-level facade over a `Connection`.
//!
//! ## Execution modes
//! - `Atomic`: each command is written and its reply read immediately
//! - `Transaction` (after `multi()`): each command must be answered with
//!   `+QUEUED`; the real replies arrive as one array on `exec()`
//! - `Pipeline` (after `pipeline()`): commands are buffered locally and
//!   flushed together on `exec()`
//!
//! In the batching modes every command call returns `true` once queued, and
//! its reply kind is remembered so `exec()` can decode the replies in order.

mod commands;

use bytes::Bytes;

use crate::config::Config;
use crate::error::Result;
use crate::network::{Connection, Mode, Status};
use crate::protocol::{encode_command, encode_static, Arg, Header};
use crate::reply::{ReplyKind, SessionUpdate};
use crate::value::Value;

/// A connected client with typed command helpers
#[derive(Debug)]
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Open a client (lazily when the config says so)
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(config)?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    pub fn status(&self) -> Status {
        self.conn.status()
    }

    pub fn mode(&self) -> Mode {
        self.conn.mode()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.conn.last_error()
    }

    pub fn clear_last_error(&mut self) {
        self.conn.clear_last_error()
    }

    pub fn take_error(&mut self) -> Option<crate::error::RespError> {
        self.conn.take_error()
    }

    /// Reopen the socket, leaving the Failed state
    pub fn connect(&mut self) -> Result<()> {
        self.conn.connect()
    }

    /// Close the connection (QUIT unless persistent)
    pub fn disconnect(&mut self) -> bool {
        self.conn.disconnect()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Send an encoded command and read (or queue) its reply
    pub(crate) fn dispatch(&mut self, cmd: Bytes, kind: ReplyKind) -> Result<Value> {
        match self.conn.mode() {
            Mode::Atomic => {
                self.conn.write(&cmd)?;
                self.conn.read_kind(&kind)
            }
            Mode::Transaction => {
                self.conn.write(&cmd)?;
                match self.conn.read_header()? {
                    Header::Status(text) if text.as_ref() == b"QUEUED" => {
                        self.conn.queued.push(kind);
                        Ok(Value::Bool(true))
                    }
                    other => self.conn.unexpected(other),
                }
            }
            Mode::Pipeline => {
                self.conn.pipeline.extend_from_slice(&cmd);
                self.conn.queued.push(kind);
                Ok(Value::Bool(true))
            }
        }
    }

    // =========================================================================
    // Transactions and pipelines
    // =========================================================================

    /// Send MULTI and enter Transaction mode
    ///
    /// Returns false if the server refuses or a pipeline is open.
    pub fn multi(&mut self) -> Result<bool> {
        match self.conn.mode() {
            Mode::Transaction => return Ok(true),
            Mode::Pipeline => {
                tracing::warn!("MULTI inside a pipeline is not supported");
                return Ok(false);
            }
            Mode::Atomic => {}
        }
        self.conn.write(&encode_static("MULTI", &[]))?;
        let entered = self.conn.read_kind(&ReplyKind::Ack(None))?.as_bool() == Some(true);
        if entered {
            self.conn.queued.clear();
            self.conn.set_mode(Mode::Transaction);
        }
        Ok(entered)
    }

    /// Enter Pipeline mode; nothing is sent until `exec()`
    pub fn pipeline(&mut self) -> bool {
        match self.conn.mode() {
            Mode::Pipeline => true,
            Mode::Transaction => false,
            Mode::Atomic => {
                self.conn.discard_batch();
                self.conn.set_mode(Mode::Pipeline);
                true
            }
        }
    }

    /// Finish the batch and return one value per queued command
    ///
    /// A transaction aborted because a WATCHed key changed yields `Nil`.
    /// Outside a batch this is `false`.
    pub fn exec(&mut self) -> Result<Value> {
        let result = match self.conn.mode() {
            Mode::Atomic => return Ok(Value::Bool(false)),
            Mode::Transaction => self.exec_transaction(),
            Mode::Pipeline => self.exec_pipeline(),
        };

        self.conn.set_mode(Mode::Atomic);
        self.conn.discard_batch();
        if result.is_err() && self.conn.status() != Status::Failed {
            // Replies of the batch may still be in flight
            self.conn.fail();
        }
        result
    }

    fn exec_transaction(&mut self) -> Result<Value> {
        let queued = std::mem::take(&mut self.conn.queued);
        self.conn.write(&encode_static("EXEC", &[]))?;
        self.conn.set_watching(false);

        match self.conn.read_header()? {
            Header::Array(Some(count)) => {
                let fallback = ReplyKind::Variant;
                let mut results = Vec::with_capacity(count.min(1024));
                for index in 0..count {
                    let kind = queued.get(index).unwrap_or(&fallback);
                    let header = self.conn.next_header()?;
                    results.push(self.conn.read_with(kind, header)?);
                }
                Ok(Value::Array(results))
            }
            Header::Array(None) => {
                tracing::debug!("Transaction aborted by a WATCHed key");
                Ok(Value::Nil)
            }
            other => self.conn.unexpected(other),
        }
    }

    fn exec_pipeline(&mut self) -> Result<Value> {
        let queued = std::mem::take(&mut self.conn.queued);
        let buffered = self.conn.pipeline.split().freeze();
        if queued.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }

        tracing::debug!(
            "Flushing pipeline: {} commands, {} bytes",
            queued.len(),
            buffered.len()
        );
        self.conn.write(&buffered)?;

        let mut results = Vec::with_capacity(queued.len());
        for kind in &queued {
            let header = self.conn.next_header()?;
            results.push(self.conn.read_with(kind, header)?);
        }
        Ok(Value::Array(results))
    }

    /// Abandon the current batch
    ///
    /// Sends DISCARD inside a transaction; drops the buffer of a pipeline.
    pub fn discard(&mut self) -> Result<bool> {
        match self.conn.mode() {
            Mode::Atomic => Ok(false),
            Mode::Pipeline => {
                self.conn.discard_batch();
                self.conn.set_mode(Mode::Atomic);
                Ok(true)
            }
            Mode::Transaction => {
                // Still in Transaction mode here, so a lost socket fails
                // instead of reconnecting
                let value = self
                    .conn
                    .write(&encode_static("DISCARD", &[]))
                    .and_then(|_| self.conn.read_kind(&ReplyKind::Ack(None)));
                self.conn.discard_batch();
                self.conn.set_mode(Mode::Atomic);
                self.conn.set_watching(false);
                Ok(value?.as_bool() == Some(true))
            }
        }
    }

    /// WATCH keys; while watching, a lost connection is not reconnected
    ///
    /// The flag is set once the server acknowledges, so inside a pipeline it
    /// takes effect at `exec()`.
    pub fn watch<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<bool> {
        let mut parts: Vec<Vec<u8>> = vec![b"WATCH".to_vec()];
        parts.extend(self.conn.prefix().apply_all(keys));
        let value = self.dispatch(
            encode_command(&parts),
            ReplyKind::Ack(Some(SessionUpdate::Watch(true))),
        )?;
        Ok(value.as_bool() == Some(true))
    }

    pub fn unwatch(&mut self) -> Result<bool> {
        let value = self.dispatch(
            encode_static("UNWATCH", &[]),
            ReplyKind::Ack(Some(SessionUpdate::Watch(false))),
        )?;
        Ok(value.as_bool() == Some(true))
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// AUTH; the credential is kept and replayed after reconnects
    pub fn auth(&mut self, password: &[u8]) -> Result<Value> {
        let password = Bytes::copy_from_slice(password);
        let cmd = encode_static("AUTH", &[Arg::Bytes(&password)]);
        self.dispatch(
            cmd,
            ReplyKind::Ack(Some(SessionUpdate::Auth(password))),
        )
    }

    /// SELECT; the index is kept and replayed after reconnects
    pub fn select(&mut self, db: i64) -> Result<Value> {
        let cmd = encode_static("SELECT", &[Arg::Long(db)]);
        self.dispatch(cmd, ReplyKind::Ack(Some(SessionUpdate::Select(db))))
    }

    pub fn ping(&mut self) -> Result<Value> {
        self.dispatch(encode_static("PING", &[]), ReplyKind::RawString)
    }

    pub fn echo(&mut self, message: &[u8]) -> Result<Value> {
        let cmd = encode_static("ECHO", &[Arg::Bytes(message)]);
        self.dispatch(cmd, ReplyKind::RawString)
    }
}
