//! Codec Tests
//!
//! Tests for the value serializers and the key prefixer.

use bytes::Bytes;
use indexmap::IndexMap;
use resplink::prefix::KeyPrefix;
use resplink::{RespError, Serializer, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn nested_value() -> Value {
    let mut map = IndexMap::new();
    map.insert(Bytes::from_static(b"zeta"), Value::Int(1));
    map.insert(Bytes::from_static(b"alpha"), Value::Double(2.5));
    map.insert(
        Bytes::from_static(b"list"),
        Value::Array(vec![Value::from("x"), Value::Nil, Value::Bool(true)]),
    );
    Value::Map(map)
}

// =============================================================================
// None Serializer Tests
// =============================================================================

#[test]
fn test_none_passes_bytes_through() {
    let out = Serializer::None.serialize(&Value::from("plain")).unwrap();
    assert_eq!(&out[..], b"plain");
    assert_eq!(
        Serializer::None.unserialize(Bytes::from_static(b"plain")),
        Value::from("plain")
    );
}

#[test]
fn test_none_stringifies_scalars() {
    let s = Serializer::None;
    assert_eq!(&s.serialize(&Value::Int(-42)).unwrap()[..], b"-42");
    assert_eq!(&s.serialize(&Value::Double(3.0)).unwrap()[..], b"3");
    assert_eq!(&s.serialize(&Value::Double(2.50)).unwrap()[..], b"2.5");
    assert_eq!(&s.serialize(&Value::Bool(true)).unwrap()[..], b"1");
    assert_eq!(&s.serialize(&Value::Bool(false)).unwrap()[..], b"");
    assert_eq!(&s.serialize(&Value::Nil).unwrap()[..], b"");
}

#[test]
fn test_none_flattens_composites() {
    let out = Serializer::None.serialize(&nested_value()).unwrap();
    assert_eq!(&out[..], b"Array");
}

// =============================================================================
// Structured and Compact Tests
// =============================================================================

#[test]
fn test_structured_round_trips_nested_value() {
    let value = nested_value();
    let encoded = Serializer::Structured.serialize(&value).unwrap();
    assert_eq!(Serializer::Structured.unserialize(encoded), value);
}

#[test]
fn test_compact_round_trips_nested_value() {
    let value = nested_value();
    let encoded = Serializer::Compact.serialize(&value).unwrap();
    assert_eq!(Serializer::Compact.unserialize(encoded), value);
}

#[test]
fn test_map_order_survives_codecs() {
    for serializer in [Serializer::Structured, Serializer::Compact] {
        let encoded = serializer.serialize(&nested_value()).unwrap();
        let decoded = serializer.unserialize(encoded);
        let keys: Vec<&[u8]> = decoded
            .as_map()
            .unwrap()
            .keys()
            .map(|k| k.as_ref())
            .collect();
        assert_eq!(keys, vec![&b"zeta"[..], &b"alpha"[..], &b"list"[..]]);
    }
}

#[test]
fn test_codecs_produce_distinct_encodings() {
    let value = Value::Array((0..32).map(Value::Int).collect());
    let json = Serializer::Structured.serialize(&value).unwrap();
    let bin = Serializer::Compact.serialize(&value).unwrap();
    assert_ne!(json, bin);
    assert!(!bin.is_empty());
}

#[test]
fn test_undecodable_payload_stays_raw() {
    for serializer in [Serializer::Structured, Serializer::Compact] {
        let raw = Bytes::from_static(b"not encoded by anyone");
        assert_eq!(serializer.unserialize(raw.clone()), Value::Bytes(raw));
    }
}

#[test]
fn test_try_unserialize_reports_failure() {
    match Serializer::Structured.try_unserialize(b"{broken") {
        Err(RespError::Serialization(_)) => {}
        other => panic!("Expected serialization error, got {:?}", other),
    }
    assert!(Serializer::Compact.try_unserialize(b"\xff\xff\xff\xff").is_err());
}

#[test]
fn test_compact_rejects_trailing_bytes() {
    let mut encoded = Serializer::Compact
        .serialize(&Value::Int(7))
        .unwrap()
        .to_vec();
    encoded.push(0);
    assert!(Serializer::Compact.try_unserialize(&encoded).is_err());
}

#[test]
fn test_serializer_defaults_and_names() {
    assert_eq!(Serializer::default(), Serializer::None);
    assert_eq!(Serializer::None.name(), "none");
    assert_eq!(Serializer::Structured.name(), "structured");
    assert_eq!(Serializer::Compact.name(), "compact");
}

// =============================================================================
// Value Accessor Tests
// =============================================================================

#[test]
fn test_value_accessors() {
    assert!(Value::Nil.is_nil());
    assert!(Value::Bool(false).is_false());
    assert_eq!(Value::Int(3).as_int(), Some(3));
    assert_eq!(Value::Int(3).as_double(), Some(3.0));
    assert_eq!(Value::from("hi").as_bytes(), Some(&b"hi"[..]));
    assert_eq!(Value::from(vec![Value::Nil]).as_array().map(|a| a.len()), Some(1));
    assert_eq!(Value::Bool(true).as_int(), None);
}

// =============================================================================
// Key Prefix Tests
// =============================================================================

#[test]
fn test_prefix_applied() {
    let prefix = KeyPrefix::new(Some(&b"app:"[..]));
    assert_eq!(&prefix.apply(b"user")[..], b"app:user");
    assert_eq!(prefix.get(), Some(&b"app:"[..]));
}

#[test]
fn test_no_prefix_borrows_key() {
    let prefix = KeyPrefix::new(None);
    assert!(matches!(prefix.apply(b"user"), std::borrow::Cow::Borrowed(_)));
}

#[test]
fn test_empty_prefix_is_none() {
    let prefix = KeyPrefix::new(Some(&b""[..]));
    assert_eq!(prefix.get(), None);
    assert_eq!(&prefix.apply(b"k")[..], b"k");
}

#[test]
fn test_prefix_apply_all() {
    let prefix = KeyPrefix::new(Some(&b"p:"[..]));
    assert_eq!(
        prefix.apply_all(&["a", "b"]),
        vec![b"p:a".to_vec(), b"p:b".to_vec()]
    );
}
