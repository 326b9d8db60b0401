//! Socket stream
//!
//! A TCP or unix-domain stream behind one type, plus the non-blocking
//! end-of-file probe used before every read and write.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::config::Config;

/// Underlying transport for a connection
#[derive(Debug)]
pub enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    /// Open a stream to the configured target
    ///
    /// TCP streams get TCP_NODELAY. The read timeout is applied to both kinds.
    pub fn connect(config: &Config) -> io::Result<Stream> {
        let stream = if config.is_unix_socket() {
            Self::connect_unix(&config.host)?
        } else {
            Self::connect_tcp(&config.host, config.effective_port(), config.connect_timeout())?
        };
        stream.set_read_timeout(config.read_timeout())?;
        Ok(stream)
    }

    fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<Stream> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    // Disable Nagle's algorithm: every command is a small write
                    stream.set_nodelay(true)?;
                    return Ok(Stream::Tcp(stream));
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("could not resolve {}:{}", host, port),
            )
        }))
    }

    #[cfg(unix)]
    fn connect_unix(path: &str) -> io::Result<Stream> {
        Ok(Stream::Unix(UnixStream::connect(path)?))
    }

    #[cfg(not(unix))]
    fn connect_unix(path: &str) -> io::Result<Stream> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("unix sockets are not supported on this platform: {}", path),
        ))
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.set_read_timeout(timeout),
            #[cfg(unix)]
            Stream::Unix(s) => s.set_read_timeout(timeout),
        }
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.set_nonblocking(nonblocking),
            #[cfg(unix)]
            Stream::Unix(s) => s.set_nonblocking(nonblocking),
        }
    }

    pub fn shutdown(&self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Stream::Unix(s) => s.shutdown(Shutdown::Both),
        }
    }

    /// Peer address for logging
    pub fn peer(&self) -> String {
        match self {
            Stream::Tcp(s) => s
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            #[cfg(unix)]
            Stream::Unix(s) => s
                .peer_addr()
                .ok()
                .and_then(|a| a.as_pathname().map(|p| p.display().to_string()))
                .unwrap_or_else(|| "unix".to_string()),
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Stream::Unix(s) => s.flush(),
        }
    }
}

/// Check whether the peer has closed the stream, without blocking
///
/// Bytes already buffered mean the stream is alive. Otherwise the socket is
/// switched to non-blocking mode for one fill: zero bytes is end-of-file,
/// `WouldBlock` means alive and idle. Anything read stays in the buffer.
pub fn probe_eof(reader: &mut BufReader<Stream>) -> bool {
    if !reader.buffer().is_empty() {
        return false;
    }
    if reader.get_ref().set_nonblocking(true).is_err() {
        return true;
    }
    let eof = match reader.fill_buf() {
        Ok(buf) => buf.is_empty(),
        Err(e) => !matches!(
            e.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
        ),
    };
    if reader.get_ref().set_nonblocking(false).is_err() {
        return true;
    }
    eof
}
