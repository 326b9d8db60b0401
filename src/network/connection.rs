//! Connection Manager
//!
//! Owns the socket of one logical session and everything the server
//! remembers about it: selected database, credential, transaction/watch
//! state. Before every read and write the stream is checked for
//! end-of-file; a closed stream is reconnected (with jittered backoff) and
//! the session's AUTH/SELECT replayed, unless a transaction or WATCH makes
//! a silent retry unsafe.

use std::io::{BufReader, Write};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::codec::Serializer;
use crate::config::{Config, MAX_RECONNECT_ATTEMPTS};
use crate::error::{RespError, Result};
use crate::prefix::KeyPrefix;
use crate::protocol::{decoder, encode_command, encode_static, errors, Arg, Header, Reply};
use crate::reply::ReplyKind;

use super::backoff::Backoff;
use super::stream::{probe_eof, Stream};

/// Socket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No socket
    Disconnected,
    /// Socket open
    Connected,
    /// Lazily opened: assumed usable, not yet connected
    Unknown,
    /// Connection lost; terminal until an explicit `connect()`
    Failed,
}

/// Whether replies are returned per command or accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Atomic,
    /// Inside MULTI: commands are queued server-side until EXEC
    Transaction,
    /// Commands are buffered client-side and flushed together
    Pipeline,
}

/// Counters kept per connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Socket opens after a detected end-of-file, successful or not
    pub reconnect_attempts: u64,
    /// Reconnects that produced a live socket with the session replayed
    pub reconnects: u64,
}

/// A single stateful connection to the server
pub struct Connection {
    config: Config,

    /// Buffered reader over the socket; writes go straight to the inner stream
    stream: Option<BufReader<Stream>>,

    status: Status,
    mode: Mode,
    watching: bool,
    database: i64,
    auth: Option<Bytes>,
    serializer: Serializer,
    prefix: KeyPrefix,
    last_error: Option<String>,

    backoff: Backoff,
    stats: ConnectionStats,

    /// Reused line buffer for reply headers
    line: Vec<u8>,

    /// Reply readers owed to queued transaction/pipeline commands
    pub(crate) queued: Vec<ReplyKind>,

    /// Encoded commands waiting for a pipeline flush
    pub(crate) pipeline: BytesMut,
}

impl Connection {
    /// Create a connection without opening the socket
    pub fn new(config: Config) -> Self {
        let backoff = Backoff::new(config.retry_interval());
        Self {
            status: Status::Disconnected,
            mode: Mode::Atomic,
            watching: false,
            database: config.database,
            auth: config.auth.clone().map(Bytes::from),
            serializer: config.serializer,
            prefix: KeyPrefix::new(config.prefix.as_deref()),
            last_error: None,
            backoff,
            stats: ConnectionStats::default(),
            line: Vec::with_capacity(128),
            queued: Vec::new(),
            pipeline: BytesMut::new(),
            stream: None,
            config,
        }
    }

    /// Create a connection and open it, or mark it Unknown when lazy
    pub fn open(config: Config) -> Result<Self> {
        let mut conn = Self::new(config);
        if conn.config.lazy_connect {
            conn.status = Status::Unknown;
        } else {
            conn.connect()?;
        }
        Ok(conn)
    }

    /// Replace the jitter source, for deterministic tests
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open the socket, replacing any existing one
    ///
    /// On failure the connection is left Disconnected.
    pub fn connect(&mut self) -> Result<()> {
        self.config.validate()?;

        // A socket being replaced keeps its session; one explicitly
        // disconnected starts over from the configured database
        if self.status == Status::Disconnected {
            self.database = self.config.database;
        }
        self.close_stream();
        self.mode = Mode::Atomic;
        self.watching = false;
        self.discard_batch();

        let stream = match Stream::connect(&self.config) {
            Ok(stream) => stream,
            Err(e) => {
                self.status = Status::Disconnected;
                tracing::debug!("Connect to {} failed: {}", self.config.target(), e);
                return Err(RespError::Connection(format!(
                    "failed to connect to {}: {}",
                    self.config.target(),
                    e
                )));
            }
        };

        tracing::debug!("Connected to {} ({})", self.config.target(), stream.peer());
        self.stream = Some(BufReader::new(stream));
        self.status = Status::Connected;

        if self.has_session_state() {
            if let Err(e) = self.replay_session() {
                self.close_stream();
                self.status = Status::Disconnected;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Make sure a socket exists according to the current status
    ///
    /// A lazily opened (Unknown) connection is only really connected when
    /// `force` is set.
    pub fn server_open(&mut self, force: bool) -> Result<()> {
        match self.status {
            Status::Disconnected | Status::Failed => self.connect(),
            Status::Connected => Ok(()),
            Status::Unknown => {
                if force {
                    self.connect()
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Close the socket, sending QUIT first for non-persistent sockets
    ///
    /// Returns true when there was a socket to close.
    pub fn disconnect(&mut self) -> bool {
        self.database = 0;
        self.watching = false;
        self.mode = Mode::Atomic;
        self.discard_batch();

        let closed = match self.stream.as_mut() {
            Some(reader) => {
                if !self.config.persistent {
                    let quit = encode_command(&[b"QUIT"]);
                    // Best effort; the socket is closed either way
                    let _ = reader.get_mut().write_all(&quit);
                }
                true
            }
            None => false,
        };

        self.close_stream();
        self.status = Status::Disconnected;
        closed
    }

    /// Check the stream for end-of-file and recover if allowed
    ///
    /// Called before every write and every read.
    pub fn ensure_live(&mut self) -> Result<()> {
        let eof = match self.stream.as_mut() {
            Some(reader) => probe_eof(reader),
            None => {
                return match self.status {
                    Status::Unknown => self.connect(),
                    Status::Disconnected => {
                        Err(RespError::Connection("connection closed".to_string()))
                    }
                    Status::Connected | Status::Failed => {
                        Err(RespError::Connection("connection lost".to_string()))
                    }
                };
            }
        };
        if !eof {
            return Ok(());
        }

        tracing::debug!("End of stream detected on {}", self.config.target());

        let mut eof = eof;
        let mut attempt: u32 = 0;
        while eof {
            if self.mode == Mode::Transaction || self.watching || attempt == MAX_RECONNECT_ATTEMPTS {
                if attempt == 0 {
                    tracing::warn!(
                        "Connection to {} lost inside a transaction or WATCH, not reconnecting",
                        self.config.target()
                    );
                } else {
                    tracing::warn!(
                        "Giving up on {} after {} reconnect attempts",
                        self.config.target(),
                        attempt
                    );
                }
                self.fail();
                return Err(RespError::Connection("connection lost".to_string()));
            }

            self.close_stream();

            let delay = self.backoff.delay(attempt);
            if delay > Duration::ZERO {
                std::thread::sleep(delay);
            }

            attempt += 1;
            self.stats.reconnect_attempts += 1;
            tracing::info!(
                "Reconnecting to {} (attempt {}/{})",
                self.config.target(),
                attempt,
                MAX_RECONNECT_ATTEMPTS
            );

            match Stream::connect(&self.config) {
                Ok(stream) => {
                    let mut reader = BufReader::new(stream);
                    eof = probe_eof(&mut reader);
                    self.stream = Some(reader);
                }
                Err(e) => {
                    tracing::debug!("Reconnect attempt {} failed: {}", attempt, e);
                    eof = true;
                }
            }
        }

        self.status = Status::Connected;
        if self.has_session_state() {
            if let Err(e) = self.replay_session() {
                self.fail();
                return Err(e);
            }
        }
        self.stats.reconnects += 1;
        tracing::info!("Reconnected to {}", self.config.target());
        Ok(())
    }

    /// Write raw bytes after the liveness check
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        if self.status == Status::Disconnected {
            return Err(RespError::Connection("connection closed".to_string()));
        }
        self.ensure_live()?;
        self.raw_write(bytes)?;
        Ok(bytes.len())
    }

    // =========================================================================
    // Session replay
    // =========================================================================

    fn has_session_state(&self) -> bool {
        self.auth.is_some() || self.database != 0
    }

    /// Re-send AUTH and SELECT on a fresh socket
    fn replay_session(&mut self) -> Result<()> {
        if let Some(auth) = self.auth.clone() {
            let cmd = encode_static("AUTH", &[Arg::Bytes(&auth)]);
            self.replay_one("AUTH", &cmd)?;
        }
        if self.database != 0 {
            let cmd = encode_static("SELECT", &[Arg::Long(self.database)]);
            self.replay_one("SELECT", &cmd)?;
        }
        Ok(())
    }

    fn replay_one(&mut self, name: &str, cmd: &[u8]) -> Result<()> {
        let accepted = self
            .raw_write(cmd)
            .and_then(|_| self.next_header())
            .map(|header| matches!(header, Header::Status(ref text) if text.starts_with(b"OK")));

        match accepted {
            Ok(true) => {
                tracing::debug!("Replayed {} on {}", name, self.config.target());
                Ok(())
            }
            Ok(false) => Err(RespError::Connection(format!(
                "{} rejected while restoring the session",
                name
            ))),
            Err(e) => Err(RespError::Connection(format!(
                "{} failed while restoring the session: {}",
                name, e
            ))),
        }
    }

    // =========================================================================
    // Raw I/O
    // =========================================================================

    fn raw_write(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(reader) = self.stream.as_mut() else {
            return Err(RespError::Connection("connection lost".to_string()));
        };
        let written = reader.get_mut().write_all(bytes).and_then(|_| reader.get_mut().flush());
        if let Err(e) = written {
            tracing::warn!("Write to {} failed: {}", self.config.target(), e);
            self.fail();
            return Err(RespError::Connection(format!("write error on connection: {}", e)));
        }
        tracing::trace!("Wrote {} bytes to {}", bytes.len(), self.config.target());
        Ok(())
    }

    /// Read the header line of the next reply, after the liveness check
    pub(crate) fn read_header(&mut self) -> Result<Header> {
        self.ensure_live()?;
        self.next_header()
    }

    /// Read the next header line without the liveness check, for frames
    /// already in progress
    pub(crate) fn next_header(&mut self) -> Result<Header> {
        let Some(reader) = self.stream.as_mut() else {
            return Err(RespError::Connection("connection lost".to_string()));
        };
        let result = decoder::read_header(reader, &mut self.line);
        result.map_err(|e| self.read_failure(e))
    }

    /// Read a bulk payload whose header was just consumed
    pub(crate) fn read_bulk_body(&mut self, len: usize) -> Result<Bytes> {
        let Some(reader) = self.stream.as_mut() else {
            return Err(RespError::Connection("connection lost".to_string()));
        };
        let result = decoder::read_bulk_body(reader, len);
        result.map_err(|e| self.read_failure(e))
    }

    /// Read one complete frame without interpreting it
    pub fn read_reply(&mut self) -> Result<Reply> {
        self.ensure_live()?;
        let Some(reader) = self.stream.as_mut() else {
            return Err(RespError::Connection("connection lost".to_string()));
        };
        let result = decoder::read_reply(reader);
        result.map_err(|e| self.read_failure(e))
    }

    /// Any failure mid-read leaves an unknown amount of the frame unread,
    /// so the socket cannot be reused
    fn read_failure(&mut self, err: RespError) -> RespError {
        match err {
            RespError::Io(e) => {
                tracing::warn!("Read from {} failed: {}", self.config.target(), e);
                self.fail();
                RespError::Connection(format!("read error on connection: {}", e))
            }
            RespError::Protocol(msg) => {
                tracing::warn!("Protocol error from {}: {}", self.config.target(), msg);
                self.fail();
                RespError::Protocol(msg)
            }
            other => other,
        }
    }

    // =========================================================================
    // Errors and state transitions
    // =========================================================================

    /// Record an error reply and raise it if it is one of the fatal kinds
    pub(crate) fn server_error(&mut self, payload: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(payload).into_owned();
        tracing::debug!("Server error reply: {}", text);
        self.last_error = Some(text);
        errors::check(payload)
    }

    /// Enter the Failed state: no socket, no batch, no transaction
    pub(crate) fn fail(&mut self) {
        self.close_stream();
        self.status = Status::Failed;
        self.mode = Mode::Atomic;
        self.watching = false;
        self.discard_batch();
    }

    pub(crate) fn discard_batch(&mut self) {
        self.queued.clear();
        self.pipeline.clear();
    }

    fn close_stream(&mut self) {
        if let Some(reader) = self.stream.take() {
            let _ = reader.get_ref().shutdown();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    pub(crate) fn set_watching(&mut self, watching: bool) {
        self.watching = watching;
    }

    pub fn database(&self) -> i64 {
        self.database
    }

    pub(crate) fn set_database(&mut self, db: i64) {
        self.database = db;
    }

    pub fn auth(&self) -> Option<&[u8]> {
        self.auth.as_deref()
    }

    pub(crate) fn set_auth(&mut self, password: Bytes) {
        self.auth = Some(password);
    }

    pub fn serializer(&self) -> Serializer {
        self.serializer
    }

    pub fn set_serializer(&mut self, serializer: Serializer) {
        self.serializer = serializer;
    }

    pub fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: Option<&[u8]>) {
        self.prefix = KeyPrefix::new(prefix);
    }

    /// Text of the most recent error reply
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    /// Take the most recent error reply as an error value, clearing it
    ///
    /// Lets a caller turn a `false` reply back into something to propagate
    /// with `?`.
    pub fn take_error(&mut self) -> Option<RespError> {
        self.last_error.take().map(RespError::Server)
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("target", &self.config.target())
            .field("status", &self.status)
            .field("mode", &self.mode)
            .field("watching", &self.watching)
            .field("database", &self.database)
            .field("serializer", &self.serializer)
            .finish()
    }
}
