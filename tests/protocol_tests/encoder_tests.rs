//! Encoder Tests
//!
//! Tests for request framing: static, incremental and growth forms, inline
//! commands and double formatting.

use std::io::Cursor;

use bytes::Bytes;
use resplink::protocol::{
    encode_command, encode_inline, encode_static, format_double, read_reply, Arg, CommandBuilder,
    Reply,
};
use resplink::RespError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Decode an encoded request back into its words
fn decode_words(frame: &[u8]) -> Vec<Vec<u8>> {
    let mut cursor = Cursor::new(frame.to_vec());
    let reply = read_reply(&mut cursor).unwrap();
    assert_eq!(cursor.position() as usize, frame.len(), "trailing bytes after frame");
    match reply {
        Reply::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Reply::Bulk(bytes) => bytes.to_vec(),
                other => panic!("Expected bulk argument, got {:?}", other),
            })
            .collect(),
        other => panic!("Expected array frame, got {:?}", other),
    }
}

// =============================================================================
// Static Form Tests
// =============================================================================

#[test]
fn test_encode_static_get() {
    let frame = encode_static("GET", &[Arg::Bytes(b"foo")]);
    assert_eq!(&frame[..], b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n");
}

#[test]
fn test_encode_static_no_arguments() {
    let frame = encode_static("PING", &[]);
    assert_eq!(&frame[..], b"*1\r\n$4\r\nPING\r\n");
}

#[test]
fn test_encode_static_typed_arguments() {
    let frame = encode_static(
        "ZADD",
        &[Arg::Bytes(b"z"), Arg::Double(1.5), Arg::Int(-7), Arg::Long(i64::MAX)],
    );
    assert_eq!(
        decode_words(&frame),
        vec![
            b"ZADD".to_vec(),
            b"z".to_vec(),
            b"1.5".to_vec(),
            b"-7".to_vec(),
            b"9223372036854775807".to_vec(),
        ]
    );
}

#[test]
fn test_encode_static_binary_safe() {
    let payload = b"a\r\nb\0c";
    let frame = encode_static("SET", &[Arg::Bytes(b"k"), Arg::Bytes(payload)]);
    assert_eq!(&frame[..], b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$6\r\na\r\nb\0c\r\n");
    assert_eq!(decode_words(&frame)[2], payload.to_vec());
}

#[test]
fn test_encode_static_empty_argument() {
    let frame = encode_static("SET", &[Arg::Bytes(b"k"), Arg::Bytes(b"")]);
    assert_eq!(&frame[..], b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$0\r\n\r\n");
}

#[test]
fn test_encode_command_words() {
    let frame = encode_command(&["CONFIG", "GET", "maxmemory"]);
    assert_eq!(
        &frame[..],
        b"*3\r\n$6\r\nCONFIG\r\n$3\r\nGET\r\n$9\r\nmaxmemory\r\n"
    );
}

#[test]
fn test_arg_from_conversions() {
    let owned = Bytes::from_static(b"bytes");
    assert_eq!(Arg::from("s"), Arg::Bytes(b"s"));
    assert_eq!(Arg::from(&owned), Arg::Bytes(b"bytes"));
    assert_eq!(Arg::from(3i32), Arg::Int(3));
    assert_eq!(Arg::from(3i64), Arg::Long(3));
    assert_eq!(Arg::from(0.5f64), Arg::Double(0.5));
}

// =============================================================================
// Builder Tests
// =============================================================================

#[test]
fn test_builder_declared_count() {
    let mut cmd = CommandBuilder::new("HMGET", 3);
    cmd.append(b"h").append(b"f1").append(b"f2");
    assert_eq!(cmd.argc(), 3);
    let frame = cmd.finish().unwrap();
    assert_eq!(&frame[..], b"*4\r\n$5\r\nHMGET\r\n$1\r\nh\r\n$2\r\nf1\r\n$2\r\nf2\r\n");
}

#[test]
fn test_builder_declared_count_mismatch() {
    let mut cmd = CommandBuilder::new("HMGET", 3);
    cmd.append(b"h");
    match cmd.finish() {
        Err(RespError::Protocol(msg)) => assert!(msg.contains("HMGET")),
        other => panic!("Expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_builder_growing_matches_static() {
    let mut cmd = CommandBuilder::growing("SET");
    cmd.append(b"key").append_long(42).append_int(7).append_double(2.50);
    assert_eq!(cmd.keyword(), b"SET");
    let grown = cmd.finish().unwrap();
    let fixed = encode_static(
        "SET",
        &[Arg::Bytes(b"key"), Arg::Long(42), Arg::Int(7), Arg::Double(2.5)],
    );
    assert_eq!(grown, fixed);
}

#[test]
fn test_builder_growing_no_arguments() {
    let frame = CommandBuilder::growing("MULTI").finish().unwrap();
    assert_eq!(&frame[..], b"*1\r\n$5\r\nMULTI\r\n");
}

#[test]
fn test_builder_many_arguments() {
    let mut cmd = CommandBuilder::growing("DEL");
    for i in 0..120 {
        cmd.append(format!("key:{}", i).as_bytes());
    }
    let frame = cmd.finish().unwrap();
    assert!(frame.starts_with(b"*121\r\n$3\r\nDEL\r\n"));
    let words = decode_words(&frame);
    assert_eq!(words.len(), 121);
    assert_eq!(words[120], b"key:119".to_vec());
}

// =============================================================================
// Inline Tests
// =============================================================================

#[test]
fn test_encode_inline() {
    assert_eq!(&encode_inline(&["PING"])[..], b"PING\r\n");
    assert_eq!(&encode_inline(&["SET", "a", "1"])[..], b"SET a 1\r\n");
}

// =============================================================================
// Double Formatting Tests
// =============================================================================

#[test]
#[allow(clippy::approx_constant)]
fn test_format_double_trims_zeros() {
    assert_eq!(format_double(3.0), "3");
    assert_eq!(format_double(3.14000), "3.14");
    assert_eq!(format_double(-2.5), "-2.5");
    assert_eq!(format_double(0.1), "0.1");
}

#[test]
fn test_format_double_no_exponent() {
    assert_eq!(format_double(1e21), "1000000000000000000000");
    assert_eq!(format_double(1e-7), "0.0000001");
}

#[test]
fn test_format_double_special_values() {
    assert_eq!(format_double(f64::INFINITY), "inf");
    assert_eq!(format_double(f64::NEG_INFINITY), "-inf");
    assert_eq!(format_double(f64::NAN), "nan");
    assert_eq!(format_double(-0.0), "0");
}

#[test]
fn test_double_argument_on_wire() {
    let frame = encode_static("INCRBYFLOAT", &[Arg::Bytes(b"k"), Arg::Double(3.0)]);
    assert_eq!(
        &frame[..],
        b"*3\r\n$11\r\nINCRBYFLOAT\r\n$1\r\nk\r\n$1\r\n3\r\n"
    );
}
