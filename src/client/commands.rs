//! Typed command helpers
//!
//! Each helper applies the key prefix to key arguments, runs value-bearing
//! arguments through the connection's serializer, and names the reply kind
//! that decodes the server's answer.

use std::borrow::Cow;

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::{encode_command, encode_static, Arg, CommandBuilder};
use crate::reply::{ReplyKind, ScanKind, ScoreDecode, Unserialize};
use crate::value::Value;

use super::Client;

impl Client {
    fn key<'a>(&self, key: &'a [u8]) -> Cow<'a, [u8]> {
        self.conn.prefix().apply(key)
    }

    fn pack(&self, value: &Value) -> Result<Bytes> {
        self.conn.serializer().serialize(value)
    }

    fn keyed(&self, keyword: &str, keys: &[impl AsRef<[u8]>]) -> Result<Bytes> {
        let mut cmd = CommandBuilder::growing(keyword);
        for key in keys {
            cmd.append(&self.key(key.as_ref()));
        }
        cmd.finish()
    }

    // =========================================================================
    // Strings and keys
    // =========================================================================

    pub fn get(&mut self, key: &[u8]) -> Result<Value> {
        let cmd = encode_static("GET", &[Arg::Bytes(&self.key(key))]);
        self.dispatch(cmd, ReplyKind::String)
    }

    pub fn set(&mut self, key: &[u8], value: impl Into<Value>) -> Result<Value> {
        let payload = self.pack(&value.into())?;
        let cmd = encode_static("SET", &[Arg::Bytes(&self.key(key)), Arg::Bytes(&payload)]);
        self.dispatch(cmd, ReplyKind::Ack(None))
    }

    pub fn setex(&mut self, key: &[u8], seconds: i64, value: impl Into<Value>) -> Result<Value> {
        let payload = self.pack(&value.into())?;
        let cmd = encode_static(
            "SETEX",
            &[Arg::Bytes(&self.key(key)), Arg::Long(seconds), Arg::Bytes(&payload)],
        );
        self.dispatch(cmd, ReplyKind::Ack(None))
    }

    /// Number of keys removed
    pub fn del<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<Value> {
        let cmd = self.keyed("DEL", keys)?;
        self.dispatch(cmd, ReplyKind::Integer)
    }

    pub fn exists(&mut self, key: &[u8]) -> Result<Value> {
        let cmd = encode_static("EXISTS", &[Arg::Bytes(&self.key(key))]);
        self.dispatch(cmd, ReplyKind::One)
    }

    pub fn incr(&mut self, key: &[u8]) -> Result<Value> {
        let cmd = encode_static("INCR", &[Arg::Bytes(&self.key(key))]);
        self.dispatch(cmd, ReplyKind::Integer)
    }

    pub fn incrby(&mut self, key: &[u8], by: i64) -> Result<Value> {
        let cmd = encode_static("INCRBY", &[Arg::Bytes(&self.key(key)), Arg::Long(by)]);
        self.dispatch(cmd, ReplyKind::Integer)
    }

    pub fn incrbyfloat(&mut self, key: &[u8], by: f64) -> Result<Value> {
        let cmd = encode_static("INCRBYFLOAT", &[Arg::Bytes(&self.key(key)), Arg::Double(by)]);
        self.dispatch(cmd, ReplyKind::Double)
    }

    /// TYPE as a [`KeyType`](crate::reply::KeyType) code
    pub fn key_type(&mut self, key: &[u8]) -> Result<Value> {
        let cmd = encode_static("TYPE", &[Arg::Bytes(&self.key(key))]);
        self.dispatch(cmd, ReplyKind::KeyType)
    }

    pub fn mget<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<Value> {
        let cmd = self.keyed("MGET", keys)?;
        self.dispatch(cmd, ReplyKind::MultiBulk(Unserialize::All))
    }

    // =========================================================================
    // Hashes
    // =========================================================================

    pub fn hset(&mut self, key: &[u8], field: &[u8], value: impl Into<Value>) -> Result<Value> {
        let payload = self.pack(&value.into())?;
        let cmd = encode_static(
            "HSET",
            &[Arg::Bytes(&self.key(key)), Arg::Bytes(field), Arg::Bytes(&payload)],
        );
        self.dispatch(cmd, ReplyKind::Integer)
    }

    pub fn hget(&mut self, key: &[u8], field: &[u8]) -> Result<Value> {
        let cmd = encode_static("HGET", &[Arg::Bytes(&self.key(key)), Arg::Bytes(field)]);
        self.dispatch(cmd, ReplyKind::String)
    }

    /// Field → value map, values unserialized
    pub fn hgetall(&mut self, key: &[u8]) -> Result<Value> {
        let cmd = encode_static("HGETALL", &[Arg::Bytes(&self.key(key))]);
        self.dispatch(cmd, ReplyKind::Zipped(Unserialize::Values, ScoreDecode::None))
    }

    /// Map from each requested field to its value (`Nil` when missing)
    pub fn hmget<F: AsRef<[u8]>>(&mut self, key: &[u8], fields: &[F]) -> Result<Value> {
        let mut cmd = CommandBuilder::new("HMGET", fields.len() + 1);
        cmd.append(&self.key(key));
        for field in fields {
            cmd.append(field.as_ref());
        }
        let cmd = cmd.finish()?;
        let names = fields
            .iter()
            .map(|f| Bytes::copy_from_slice(f.as_ref()))
            .collect();
        self.dispatch(cmd, ReplyKind::Assoc(names))
    }

    pub fn hkeys(&mut self, key: &[u8]) -> Result<Value> {
        let cmd = encode_static("HKEYS", &[Arg::Bytes(&self.key(key))]);
        self.dispatch(cmd, ReplyKind::MultiBulk(Unserialize::None))
    }

    // =========================================================================
    // Lists and sorted sets
    // =========================================================================

    pub fn lrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Value> {
        let cmd = encode_static(
            "LRANGE",
            &[Arg::Bytes(&self.key(key)), Arg::Long(start), Arg::Long(stop)],
        );
        self.dispatch(cmd, ReplyKind::MultiBulk(Unserialize::All))
    }

    pub fn zadd(&mut self, key: &[u8], score: f64, member: impl Into<Value>) -> Result<Value> {
        let payload = self.pack(&member.into())?;
        let cmd = encode_static(
            "ZADD",
            &[Arg::Bytes(&self.key(key)), Arg::Double(score), Arg::Bytes(&payload)],
        );
        self.dispatch(cmd, ReplyKind::Integer)
    }

    /// Members in rank order; with scores, a member → score map
    pub fn zrange(&mut self, key: &[u8], start: i64, stop: i64, withscores: bool) -> Result<Value> {
        let mut cmd = CommandBuilder::growing("ZRANGE");
        cmd.append(&self.key(key)).append_long(start).append_long(stop);
        if withscores {
            cmd.append(b"WITHSCORES");
        }
        let kind = if withscores {
            ReplyKind::Zipped(Unserialize::Keys, ScoreDecode::Double)
        } else {
            ReplyKind::MultiBulk(Unserialize::All)
        };
        self.dispatch(cmd.finish()?, kind)
    }

    // =========================================================================
    // Scripting and iteration
    // =========================================================================

    /// EVAL with prefixed keys and raw arguments, decoded generically
    pub fn eval<K: AsRef<[u8]>, A: AsRef<[u8]>>(
        &mut self,
        script: &[u8],
        keys: &[K],
        args: &[A],
    ) -> Result<Value> {
        let mut cmd = CommandBuilder::new("EVAL", 2 + keys.len() + args.len());
        cmd.append(script).append_long(keys.len() as i64);
        for key in keys {
            cmd.append(&self.key(key.as_ref()));
        }
        for arg in args {
            cmd.append(arg.as_ref());
        }
        self.dispatch(cmd.finish()?, ReplyKind::Variant)
    }

    /// One SCAN page over key names; the pattern is prefixed like a key
    pub fn scan(&mut self, cursor: u64, pattern: Option<&[u8]>, count: Option<u64>) -> Result<Value> {
        let pattern = pattern.map(|p| self.key(p).into_owned());
        let cmd = scan_command("SCAN", None, cursor, pattern.as_deref(), count)?;
        self.dispatch(cmd, ReplyKind::Scan(ScanKind::Scan))
    }

    pub fn sscan(
        &mut self,
        key: &[u8],
        cursor: u64,
        pattern: Option<&[u8]>,
        count: Option<u64>,
    ) -> Result<Value> {
        let key = self.key(key);
        let cmd = scan_command("SSCAN", Some(&key[..]), cursor, pattern, count)?;
        self.dispatch(cmd, ReplyKind::Scan(ScanKind::SScan))
    }

    pub fn zscan(
        &mut self,
        key: &[u8],
        cursor: u64,
        pattern: Option<&[u8]>,
        count: Option<u64>,
    ) -> Result<Value> {
        let key = self.key(key);
        let cmd = scan_command("ZSCAN", Some(&key[..]), cursor, pattern, count)?;
        self.dispatch(cmd, ReplyKind::Scan(ScanKind::ZScan))
    }

    pub fn hscan(
        &mut self,
        key: &[u8],
        cursor: u64,
        pattern: Option<&[u8]>,
        count: Option<u64>,
    ) -> Result<Value> {
        let key = self.key(key);
        let cmd = scan_command("HSCAN", Some(&key[..]), cursor, pattern, count)?;
        self.dispatch(cmd, ReplyKind::Scan(ScanKind::HScan))
    }

    // =========================================================================
    // Server
    // =========================================================================

    /// INFO parsed into a field map
    pub fn info(&mut self, section: Option<&[u8]>) -> Result<Value> {
        let cmd = match section {
            Some(section) => encode_static("INFO", &[Arg::Bytes(section)]),
            None => encode_static("INFO", &[]),
        };
        self.dispatch(cmd, ReplyKind::Info)
    }

    /// CLIENT LIST, one map per client
    pub fn client_list(&mut self) -> Result<Value> {
        let cmd = encode_static("CLIENT", &[Arg::Bytes(b"LIST")]);
        self.dispatch(cmd, ReplyKind::ClientList)
    }

    pub fn debug_object(&mut self, key: &[u8]) -> Result<Value> {
        let cmd = encode_static("DEBUG", &[Arg::Bytes(b"OBJECT"), Arg::Bytes(&self.key(key))]);
        self.dispatch(cmd, ReplyKind::DebugObject)
    }

    /// CONFIG GET as a parameter → value map
    pub fn config_get(&mut self, pattern: &[u8]) -> Result<Value> {
        let cmd = encode_static("CONFIG", &[Arg::Bytes(b"GET"), Arg::Bytes(pattern)]);
        self.dispatch(cmd, ReplyKind::Zipped(Unserialize::None, ScoreDecode::None))
    }

    /// PUBSUB NUMSUB as a channel → subscriber count map
    pub fn pubsub_numsub<C: AsRef<[u8]>>(&mut self, channels: &[C]) -> Result<Value> {
        let mut cmd = CommandBuilder::new("PUBSUB", channels.len() + 1);
        cmd.append(b"NUMSUB");
        for channel in channels {
            cmd.append(channel.as_ref());
        }
        self.dispatch(cmd.finish()?, ReplyKind::Zipped(Unserialize::None, ScoreDecode::Int))
    }

    /// Send an arbitrary command, keyword first, and decode the reply generically
    ///
    /// Arguments are sent as given: no prefix, no serializer.
    pub fn execute<A: AsRef<[u8]>>(&mut self, parts: &[A]) -> Result<Value> {
        self.dispatch(encode_command(parts), ReplyKind::Variant)
    }
}

fn scan_command(
    keyword: &str,
    key: Option<&[u8]>,
    cursor: u64,
    pattern: Option<&[u8]>,
    count: Option<u64>,
) -> Result<Bytes> {
    let mut cmd = CommandBuilder::growing(keyword);
    if let Some(key) = key {
        cmd.append(key);
    }
    let mut digits = itoa::Buffer::new();
    cmd.append(digits.format(cursor).as_bytes());
    if let Some(pattern) = pattern {
        cmd.append(b"MATCH").append(pattern);
    }
    if let Some(count) = count {
        cmd.append(b"COUNT").append(digits.format(count).as_bytes());
    }
    cmd.finish()
}
