//! Integration tests for the binary codec and the type registry.
//!
//! These tests push every registered value kind through the binary wire
//! format and check the failure taxonomy for corrupt and unknown input.

mod common;

use std::fmt;

use common::*;
use idgate_serializer::prelude::*;

fn round_trip(value: &Value) -> Value {
    deserialize_from_bytes(&serialize_to_bytes(value).unwrap()).unwrap()
}

// =============================================================================
// Registry Coverage
// =============================================================================

#[test]
fn test_every_value_kind_round_trips() {
    for kind in ValueKind::all() {
        let value = sample(kind);
        assert_eq!(value.kind(), kind, "sample for {kind:?} has the wrong kind");
        assert_eq!(round_trip(&value), value, "{kind:?} did not round-trip");
    }
}

#[test]
fn test_every_attribute_type_round_trips() {
    for &attribute_type in AttributeType::all() {
        let attribute = Attribute::single("value", attribute_value(attribute_type));
        let value = Value::Attribute(attribute);
        assert_eq!(round_trip(&value), value, "{attribute_type:?}");
    }
}

#[test]
fn test_every_api_operation_round_trips() {
    for &operation in ApiOperation::all() {
        let value = Value::Message(RemoteMessage::OperationRequest {
            connector_key: connector_key(),
            operation,
            arguments: Vec::new(),
        });
        assert_eq!(round_trip(&value), value, "{operation}");
    }
}

#[test]
fn test_boundary_values_round_trip() {
    for value in boundary_values() {
        assert_eq!(round_trip(&value), value, "{value:?}");
    }
}

#[test]
fn test_float_bits_preserved() {
    let quiet_nan = f64::from_bits(0x7FF8_0000_0000_0001);
    match round_trip(&Value::Double(quiet_nan)) {
        Value::Double(d) => assert_eq!(d.to_bits(), quiet_nan.to_bits()),
        other => panic!("unexpected {other:?}"),
    }
    match round_trip(&Value::Float(-0.0)) {
        Value::Float(f) => assert!(f.is_sign_negative()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_case_insensitive_set_round_trip() {
    let mut set = ValueSet::case_insensitive();
    set.insert(Value::from("foo"));

    match round_trip(&Value::Set(set)) {
        Value::Set(decoded) => {
            assert!(decoded.is_case_insensitive());
            assert!(decoded.contains(&Value::from("Foo")));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_case_sensitive_set_stays_sensitive() {
    let mut set = ValueSet::new();
    set.insert(Value::from("foo"));

    match round_trip(&Value::Set(set)) {
        Value::Set(decoded) => assert!(!decoded.contains(&Value::from("Foo"))),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_null_is_distinct_from_absent() {
    let list = Value::List(vec![Value::Null, Value::from("x"), Value::Null]);
    assert_eq!(round_trip(&list), list);
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
struct CustomFailure;

impl fmt::Display for CustomFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("custom failure")
    }
}

impl std::error::Error for CustomFailure {}

#[test]
fn test_unregistered_error_decodes_as_runtime() {
    let value = Value::from_error(&CustomFailure);
    match round_trip(&value) {
        Value::Error(error) => {
            assert_eq!(error.kind(), ErrorKind::Runtime);
            assert_eq!(error.message(), "custom failure");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_error_cause_chain_round_trips() {
    let error = ConnectorError::connection_failed_with_cause(
        "cannot reach directory",
        ConnectorError::runtime_with_cause("tls handshake", ConnectorError::io("reset")),
    );
    match round_trip(&Value::Error(error.clone())) {
        Value::Error(decoded) => {
            assert_eq!(decoded, error);
            let cause = decoded.cause().unwrap();
            assert_eq!(cause.kind(), ErrorKind::Runtime);
            assert_eq!(cause.cause().unwrap().message(), "reset");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_already_exists_keeps_uid() {
    let error = ConnectorError::already_exists("duplicate", Uid::new("u-5"));
    match round_trip(&Value::Error(error)) {
        Value::Error(decoded) => assert_eq!(decoded.uid(), Some(&Uid::new("u-5"))),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_serializer_error_converts_to_io_exception() {
    let error: ConnectorError = deserialize_from_bytes(b"IDGB\x01\x00").unwrap_err().into();
    assert_eq!(error.kind(), ErrorKind::ConnectorIo);
}

// =============================================================================
// Corrupt and Unknown Input
// =============================================================================

#[test]
fn test_truncated_stream_is_malformed_at_every_cut() {
    let bytes = serialize_to_bytes(&sample(ValueKind::ConnectorObject)).unwrap();
    for cut in 5..bytes.len() {
        match deserialize_from_bytes(&bytes[..cut]) {
            Err(SerializerError::MalformedStream(_)) => {}
            other => panic!("cut at {cut}: unexpected {other:?}"),
        }
    }
}

#[test]
fn test_empty_input_is_malformed() {
    assert!(matches!(
        deserialize_from_bytes(&[]),
        Err(SerializerError::MalformedStream(_))
    ));
}

#[test]
fn test_garbage_after_value_is_malformed() {
    let mut bytes = serialize_to_bytes(&sample(ValueKind::Uid)).unwrap();
    bytes.extend_from_slice(b"junk");
    assert!(matches!(
        deserialize_from_bytes(&bytes),
        Err(SerializerError::MalformedStream(_))
    ));
}

#[test]
fn test_unregistered_kind_names_the_type() {
    let registry = Registry::from_handlers(
        Registry::standard_handlers()
            .into_iter()
            .filter(|h| h.kind() != ValueKind::SearchResult),
    )
    .unwrap();

    let mut writer = BinaryObjectWriter::with_registry(Vec::new(), &registry).unwrap();
    match writer.write_object(&sample(ValueKind::SearchResult)) {
        Err(SerializerError::UnsupportedType { type_name }) => {
            assert_eq!(type_name, "SearchResult")
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_unregistered_id_is_not_malformed() {
    let bytes = serialize_to_bytes(&sample(ValueKind::SearchResult)).unwrap();
    let registry = Registry::from_handlers(
        Registry::standard_handlers()
            .into_iter()
            .filter(|h| h.kind() != ValueKind::SearchResult),
    )
    .unwrap();

    let mut reader = BinaryObjectReader::with_registry(bytes.as_slice(), &registry).unwrap();
    let err = reader.read_object().unwrap_err();
    assert!(matches!(err, SerializerError::UnsupportedType { .. }));
    assert!(!err.is_malformed());
}

#[test]
fn test_wrong_argument_type_is_invalid_content() {
    // Uid whose value argument is an Integer
    let mut bytes = b"IDGB\x01".to_vec();
    bytes.extend_from_slice(&[0x00, 0x30, 0x00, 0x00, 0x00, 0x02]);
    bytes.extend_from_slice(&[0x00, 0x04, 0x00, 0x00, 0x00, 0x01]);
    bytes.extend_from_slice(&[0x00, 0x01]);
    assert!(matches!(
        deserialize_from_bytes(&bytes),
        Err(SerializerError::InvalidContent { .. })
    ));
}

// =============================================================================
// Copies and Helpers
// =============================================================================

#[test]
fn test_clone_object_breaks_identity() {
    let original = Value::from("shared text");
    let copy = clone_object(&original).unwrap();
    assert_eq!(copy, original);
    match (&original, &copy) {
        (Value::String(a), Value::String(b)) => assert_ne!(a.as_ptr(), b.as_ptr()),
        _ => unreachable!(),
    }

    let object = sample(ValueKind::ConnectorObject);
    let copy = clone_object(&object).unwrap();
    assert_eq!(copy, object);
    match (&object, &copy) {
        (Value::ConnectorObject(a), Value::ConnectorObject(b)) => {
            assert!(!std::ptr::eq(a, b));
            let a = a.attribute_by_name("mail").unwrap();
            let b = b.attribute_by_name("mail").unwrap();
            assert!(!std::ptr::eq(a.values().as_ptr(), b.values().as_ptr()));
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_base64_wrapper() {
    let value = sample(ValueKind::Filter(FilterKind::And));
    let encoded = serialize_to_base64(&value).unwrap();
    assert!(encoded.starts_with("SURHQg"));
    assert_eq!(deserialize_from_base64(&encoded).unwrap(), value);
}

#[test]
fn test_stream_of_objects() {
    let mut writer = BinaryObjectWriter::new(Vec::new()).unwrap();
    for i in 0..100 {
        writer.write_object(&Value::Uid(Uid::new(format!("u-{i}")))).unwrap();
    }
    let bytes = writer.into_inner().unwrap();

    let mut reader = BinaryObjectReader::new(bytes.as_slice()).unwrap();
    let mut count = 0;
    while let Some(value) = reader.next_object().unwrap() {
        assert_eq!(value, Value::Uid(Uid::new(format!("u-{count}"))));
        count += 1;
    }
    assert_eq!(count, 100);
}
