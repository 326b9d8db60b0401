//! Configuration for resplink
//!
//! One `Config` per logical session, built once and handed to
//! `Connection::new`. Timeouts and intervals are in milliseconds; zero means
//! "not set".

use std::time::Duration;

use crate::codec::Serializer;
use crate::error::{RespError, Result};

/// Default server port when none is given for a TCP host
pub const DEFAULT_PORT: u16 = 6379;

/// Maximum reconnect attempts made by a single liveness check
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Main configuration for a connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Target
    // -------------------------------------------------------------------------
    /// Host name, IP address, or a filesystem path for a unix socket
    pub host: String,

    /// TCP port. Zero together with a path-like host selects a unix socket.
    pub port: u16,

    // -------------------------------------------------------------------------
    // Timeouts
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Read timeout applied to the socket (milliseconds)
    pub read_timeout_ms: u64,

    /// Base interval between reconnect attempts (milliseconds)
    pub retry_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------
    /// Persistent sockets are handed back to the host instead of closed,
    /// so no QUIT is sent on disconnect
    pub persistent: bool,

    /// Identity token distinguishing persistent sockets to the same target
    pub persistent_id: Option<String>,

    /// Defer the socket open until first use (status Unknown until then)
    pub lazy_connect: bool,

    /// Serializer applied to values
    pub serializer: Serializer,

    /// Namespace prefix prepended to every key
    pub prefix: Option<Vec<u8>>,

    /// Credential sent with AUTH right after connecting
    pub auth: Option<Vec<u8>>,

    /// Database selected right after connecting
    pub database: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: 0,
            read_timeout_ms: 0,
            retry_interval_ms: 0,
            persistent: false,
            persistent_id: None,
            lazy_connect: false,
            serializer: Serializer::None,
            prefix: None,
            auth: None,
            database: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// True when the target is a unix-domain socket path
    pub fn is_unix_socket(&self) -> bool {
        self.host.starts_with('/') && self.port == 0
    }

    /// Human readable target, used in logs and the persistent identity
    pub fn target(&self) -> String {
        if self.is_unix_socket() {
            format!("unix://{}", self.host)
        } else {
            format!("{}:{}", self.host, self.effective_port())
        }
    }

    /// Port with the zero default resolved
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_PORT
        } else {
            self.port
        }
    }

    /// Identity under which a host pool would park a persistent socket
    pub fn persistent_identity(&self) -> Option<String> {
        if !self.persistent {
            return None;
        }
        Some(match &self.persistent_id {
            Some(id) => format!("resplink:{}:{}", self.target(), id),
            None => format!("resplink:{}:{}", self.target(), self.connect_timeout_ms),
        })
    }

    /// Reject settings no server would accept
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(RespError::Config("host must not be empty".to_string()));
        }
        if self.database < 0 {
            return Err(RespError::Config(format!(
                "database index must be non-negative, got {}",
                self.database
            )));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn retry_interval(&self) -> Option<Duration> {
        millis(self.retry_interval_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the host (or unix socket path)
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the TCP port (0 with a path host means unix socket)
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Connect to a unix socket at `path`
    pub fn unix_socket(mut self, path: impl Into<String>) -> Self {
        self.config.host = path.into();
        self.config.port = 0;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the reconnect retry interval (in milliseconds)
    pub fn retry_interval_ms(mut self, ms: u64) -> Self {
        self.config.retry_interval_ms = ms;
        self
    }

    /// Mark the socket persistent, optionally with an identity token
    pub fn persistent(mut self, id: Option<String>) -> Self {
        self.config.persistent = true;
        self.config.persistent_id = id;
        self
    }

    /// Defer connecting until first use
    pub fn lazy_connect(mut self, lazy: bool) -> Self {
        self.config.lazy_connect = lazy;
        self
    }

    pub fn serializer(mut self, serializer: Serializer) -> Self {
        self.config.serializer = serializer;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.config.prefix = Some(prefix.into());
        self
    }

    pub fn auth(mut self, password: impl Into<Vec<u8>>) -> Self {
        self.config.auth = Some(password.into());
        self
    }

    pub fn database(mut self, db: i64) -> Self {
        self.config.database = db;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
