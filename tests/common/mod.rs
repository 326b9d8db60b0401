//! Scripted mock server shared by the network, reply and client tests
//!
//! Each accepted connection runs the next script in order. Connections are
//! served one at a time on a background thread; when the scripts run out the
//! listener is dropped so further connects are refused.

#![allow(dead_code)]

use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use resplink::protocol::{read_reply, Reply};
use resplink::Config;

/// One step of a connection script
#[derive(Debug, Clone)]
pub enum Step {
    /// Read one command, then write the given bytes
    Reply(Vec<u8>),
    /// Read one command and answer nothing
    Swallow,
    /// Write bytes without reading
    Send(Vec<u8>),
    /// Close the connection
    Close,
}

/// Something the server observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Accepted(usize),
    Command(usize, Vec<Vec<u8>>),
    Closed(usize),
    Stopped,
}

pub struct MockServer {
    addr: SocketAddr,
    events: Receiver<Event>,
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Shorthand for `Step::Reply`
pub fn reply(bytes: &[u8]) -> Step {
    Step::Reply(bytes.to_vec())
}

/// `+OK`
pub fn ok() -> Step {
    reply(b"+OK\r\n")
}

/// A command as the list of its words
pub fn words(parts: &[&str]) -> Vec<Vec<u8>> {
    parts.iter().map(|p| p.as_bytes().to_vec()).collect()
}

impl MockServer {
    /// Start serving `scripts`, one per accepted connection
    pub fn start(scripts: Vec<Vec<Step>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let (tx, rx) = unbounded();

        thread::spawn(move || {
            for (index, script) in scripts.into_iter().enumerate() {
                let Ok((stream, _)) = listener.accept() else {
                    break;
                };
                let _ = tx.send(Event::Accepted(index));
                run_script(index, stream, script, &tx);
            }
            drop(listener);
            let _ = tx.send(Event::Stopped);
        });

        Self { addr, events: rx }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Config pointing at this server, with short timeouts
    pub fn config(&self) -> Config {
        Config::builder()
            .host("127.0.0.1")
            .port(self.port())
            .connect_timeout_ms(1000)
            .read_timeout_ms(2000)
            .build()
    }

    /// Next event, or None after `timeout`
    pub fn next_event(&self, timeout: Duration) -> Option<Event> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Wait for `expected`, returning every event seen before it
    pub fn wait_for(&self, expected: &Event) -> Vec<Event> {
        let mut seen = Vec::new();
        while let Some(event) = self.next_event(Duration::from_secs(5)) {
            if &event == expected {
                return seen;
            }
            seen.push(event);
        }
        panic!("timed out waiting for {:?}, saw {:?}", expected, seen);
    }

    /// Wait until connection `index` has been closed by the server, and give
    /// the FIN time to reach the client
    pub fn wait_closed(&self, index: usize) -> Vec<Event> {
        let seen = self.wait_for(&Event::Closed(index));
        thread::sleep(Duration::from_millis(50));
        seen
    }

    /// Every command received so far, draining pending events
    pub fn commands(&self) -> Vec<Vec<Vec<u8>>> {
        let mut commands = Vec::new();
        while let Some(event) = self.next_event(Duration::from_millis(200)) {
            if let Event::Command(_, words) = event {
                commands.push(words);
            }
        }
        commands
    }
}

fn run_script(index: usize, stream: TcpStream, script: Vec<Step>, tx: &Sender<Event>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(3)));
    let mut writer = match stream.try_clone() {
        Ok(w) => w,
        Err(_) => return,
    };
    let mut reader = BufReader::new(stream);

    for step in script {
        match step {
            Step::Reply(bytes) => {
                if !read_command(index, &mut reader, tx) {
                    break;
                }
                if writer.write_all(&bytes).is_err() {
                    break;
                }
            }
            Step::Swallow => {
                if !read_command(index, &mut reader, tx) {
                    break;
                }
            }
            Step::Send(bytes) => {
                if writer.write_all(&bytes).is_err() {
                    break;
                }
            }
            Step::Close => break,
        }
    }

    let _ = writer.shutdown(std::net::Shutdown::Both);
    let _ = tx.send(Event::Closed(index));
}

fn read_command(index: usize, reader: &mut BufReader<TcpStream>, tx: &Sender<Event>) -> bool {
    match read_reply(reader) {
        Ok(Reply::Array(items)) => {
            let words = items
                .into_iter()
                .map(|item| match item {
                    Reply::Bulk(bytes) => bytes.to_vec(),
                    other => format!("{:?}", other).into_bytes(),
                })
                .collect();
            let _ = tx.send(Event::Command(index, words));
            true
        }
        _ => false,
    }
}
