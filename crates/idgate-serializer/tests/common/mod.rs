//! Common fixtures for idgate-serializer integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use idgate_connector::prelude::*;
use idgate_connector::query::QueryFilterKind;
use num_bigint::BigInt;
use rust_decimal::Decimal;
use url::Url;

pub fn account() -> ConnectorObject {
    ConnectorObject::builder(ObjectClass::account())
        .with_uid(Uid::new("u-1001").with_revision("7"))
        .with_name("bob")
        .with("mail", "bob@example.com")
        .with("age", 42i64)
        .with_attribute(Attribute::new(
            "groups",
            vec![
                AttributeValue::String("staff".to_string()),
                AttributeValue::String("admins".to_string()),
            ],
        ))
        .with_attribute(Attribute::empty("manager"))
        .build()
        .unwrap()
}

pub fn connector_key() -> ConnectorKey {
    ConnectorKey::new("org.example.ldap", "1.4.2", "LdapConnector")
}

pub fn mail(value: &str) -> Attribute {
    Attribute::single("mail", value)
}

pub fn attribute_value(attribute_type: AttributeType) -> AttributeValue {
    match attribute_type {
        AttributeType::String => AttributeValue::String("text".to_string()),
        AttributeType::Integer => AttributeValue::Integer(i32::MIN),
        AttributeType::Long => AttributeValue::Long(i64::MAX),
        AttributeType::Float => AttributeValue::Float(1.5),
        AttributeType::Double => AttributeValue::Double(-2.25),
        AttributeType::Boolean => AttributeValue::Boolean(true),
        AttributeType::Character => AttributeValue::Character('ß'),
        AttributeType::BigInteger => {
            AttributeValue::BigInteger(BigInt::from_str("-123456789012345678901234567890").unwrap())
        }
        AttributeType::BigDecimal => {
            AttributeValue::BigDecimal(Decimal::from_str("12345.6789").unwrap())
        }
        AttributeType::Bytes => AttributeValue::Bytes(vec![0, 1, 254, 255]),
        AttributeType::GuardedString => AttributeValue::GuardedString(GuardedString::new("s3cret")),
    }
}

fn filter(kind: FilterKind) -> Filter {
    match kind {
        FilterKind::And => Filter::And(vec![
            Filter::Equals(mail("a@example.com")),
            Filter::Present("phone".to_string()),
            Filter::BooleanLiteral(true),
        ]),
        FilterKind::Or => Filter::Or(vec![
            Filter::StartsWith(Attribute::single("name", "b")),
            Filter::Not(Box::new(Filter::Present("disabled".to_string()))),
        ]),
        FilterKind::Not => Filter::Not(Box::new(Filter::Contains(mail("example")))),
        FilterKind::Boolean => Filter::BooleanLiteral(false),
        FilterKind::Equals => Filter::Equals(mail("a@example.com")),
        FilterKind::Contains => Filter::Contains(mail("example")),
        FilterKind::StartsWith => Filter::StartsWith(mail("a")),
        FilterKind::EndsWith => Filter::EndsWith(mail(".com")),
        FilterKind::GreaterThan => Filter::GreaterThan(Attribute::single("age", 21i64)),
        FilterKind::GreaterThanOrEqual => {
            Filter::GreaterThanOrEqual(Attribute::single("age", 21i64))
        }
        FilterKind::LessThan => Filter::LessThan(Attribute::single("age", 65i64)),
        FilterKind::LessThanOrEqual => Filter::LessThanOrEqual(Attribute::single("score", 0.5f64)),
        FilterKind::ContainsAllValues => Filter::ContainsAllValues(Attribute::new(
            "groups",
            vec![
                AttributeValue::String("staff".to_string()),
                AttributeValue::String("admins".to_string()),
            ],
        )),
        FilterKind::Present => Filter::Present("mail".to_string()),
        FilterKind::ExtendedMatch => Filter::ExtendedMatch {
            operator: "regex".to_string(),
            attribute: Attribute::single("name", "^b.*"),
        },
    }
}

fn query_filter(kind: QueryFilterKind) -> QueryFilter {
    let name = JsonPointer::field("name");
    match kind {
        QueryFilterKind::And => QueryFilter::And(vec![
            QueryFilter::Comparison {
                field: name.clone(),
                operator: ComparisonOperator::StartsWith,
                value: AttributeValue::String("b".to_string()),
            },
            QueryFilter::Present {
                field: JsonPointer::new(["address", "city/town"]),
            },
        ]),
        QueryFilterKind::Or => QueryFilter::Or(vec![
            QueryFilter::BooleanLiteral(false),
            QueryFilter::Not(Box::new(QueryFilter::Present { field: name })),
        ]),
        QueryFilterKind::Not => QueryFilter::Not(Box::new(QueryFilter::BooleanLiteral(true))),
        QueryFilterKind::Boolean => QueryFilter::BooleanLiteral(true),
        QueryFilterKind::Comparison => QueryFilter::Comparison {
            field: JsonPointer::field("age"),
            operator: ComparisonOperator::Extended("near".to_string()),
            value: AttributeValue::Long(30),
        },
        QueryFilterKind::Present => QueryFilter::Present {
            field: JsonPointer::field("mail"),
        },
    }
}

pub fn error(kind: ErrorKind) -> ConnectorError {
    ConnectorError::new(kind, "operation failed", Some(ConnectorError::io("socket closed")))
        .with_uid(Uid::new("u-1"))
        .with_object_class(ObjectClass::account())
}

fn message(kind: MessageKind) -> RemoteMessage {
    match kind {
        MessageKind::HelloRequest => RemoteMessage::HelloRequest {
            info_level: RemoteMessage::CONNECTOR_KEY_INFO,
        },
        MessageKind::HelloResponse => RemoteMessage::HelloResponse {
            error: None,
            connector_keys: vec![connector_key()],
        },
        MessageKind::OperationRequest => RemoteMessage::OperationRequest {
            connector_key: connector_key(),
            operation: ApiOperation::Create,
            arguments: vec![
                Value::ObjectClass(ObjectClass::account()),
                Value::List(vec![Value::Attribute(mail("a@example.com"))]),
                Value::OperationOptions(OperationOptions::new().with_page_size(10)),
            ],
        },
        MessageKind::OperationResponsePart => RemoteMessage::OperationResponsePart {
            error: Some(ConnectorError::timeout("slow")),
            result: Box::new(Value::Uid(Uid::new("u-2"))),
        },
        MessageKind::OperationResponseEnd => RemoteMessage::OperationResponseEnd,
        MessageKind::OperationResponsePause => RemoteMessage::OperationResponsePause,
        MessageKind::OperationRequestMoreData => RemoteMessage::OperationRequestMoreData,
        MessageKind::OperationRequestStopData => RemoteMessage::OperationRequestStopData,
    }
}

/// A representative value of every kind.
///
/// The match is exhaustive: a new kind does not compile until it has a
/// sample here, and then fails the round-trip tests until it is registered.
pub fn sample(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Null => Value::Null,
        ValueKind::Boolean => Value::Boolean(true),
        ValueKind::Character => Value::Character('é'),
        ValueKind::Integer => Value::Integer(-17),
        ValueKind::Long => Value::Long(1 << 40),
        ValueKind::Float => Value::Float(3.25),
        ValueKind::Double => Value::Double(-0.1),
        ValueKind::String => Value::from("Hello, <world> & \"friends\""),
        ValueKind::BigInteger => Value::BigInteger(BigInt::from_str("98765432109876543210").unwrap()),
        ValueKind::BigDecimal => Value::BigDecimal(Decimal::from_str("-0.000123").unwrap()),
        ValueKind::Bytes => Value::Bytes(b"\x00binary\xff".to_vec()),
        ValueKind::Uri => Value::Uri(Url::parse("https://example.com/path?q=1#frag").unwrap()),
        ValueKind::Locale => Value::Locale(Locale::new("en", "GB", "")),
        ValueKind::File => Value::File(PathBuf::from("/var/lib/idgate/config.xml")),
        ValueKind::GuardedString => Value::GuardedString(GuardedString::new("p@ss w0rd")),
        ValueKind::BooleanArray => Value::PrimitiveArray(PrimitiveArray::Boolean(vec![true, false])),
        ValueKind::CharacterArray => {
            Value::PrimitiveArray(PrimitiveArray::Character(vec!['a', ' ', '\n', '€']))
        }
        ValueKind::IntegerArray => {
            Value::PrimitiveArray(PrimitiveArray::Integer(vec![i32::MIN, 0, i32::MAX]))
        }
        ValueKind::LongArray => Value::PrimitiveArray(PrimitiveArray::Long(vec![i64::MIN, i64::MAX])),
        ValueKind::FloatArray => Value::PrimitiveArray(PrimitiveArray::Float(vec![
            f32::NAN,
            f32::INFINITY,
            f32::MIN_POSITIVE,
        ])),
        ValueKind::DoubleArray => Value::PrimitiveArray(PrimitiveArray::Double(vec![
            f64::NEG_INFINITY,
            f64::MAX,
            -0.0,
        ])),
        ValueKind::Array => Value::Array(vec![Value::Integer(1), Value::from("two"), Value::Null]),
        ValueKind::List => Value::List(vec![Value::Long(1), Value::List(Vec::new())]),
        ValueKind::Set => {
            let mut set = ValueSet::case_insensitive();
            set.insert(Value::from("foo"));
            set.insert(Value::Integer(3));
            Value::Set(set)
        }
        ValueKind::Map => {
            let mut map = BTreeMap::new();
            map.insert("host".to_string(), Value::from("ldap.example.com"));
            map.insert("port".to_string(), Value::Integer(636));
            map.insert("tls".to_string(), Value::Boolean(true));
            Value::Map(map)
        }
        ValueKind::Uid => Value::Uid(Uid::new("u-1001").with_revision("7")),
        ValueKind::ObjectClass => Value::ObjectClass(ObjectClass::group()),
        ValueKind::Attribute => Value::Attribute(Attribute::new(
            "values",
            AttributeType::all().iter().map(|&t| attribute_value(t)).collect(),
        )),
        ValueKind::ConnectorObject => Value::ConnectorObject(account()),
        ValueKind::QualifiedUid => {
            Value::QualifiedUid(QualifiedUid::new(ObjectClass::account(), Uid::new("u-1")))
        }
        ValueKind::SyncToken => Value::SyncToken(SyncToken::new(AttributeValue::Long(1024))),
        ValueKind::SyncDelta => Value::SyncDelta(
            SyncDelta::upserted(
                SyncToken::new(AttributeValue::String("cookie-9".to_string())),
                SyncDeltaType::CreateOrUpdate,
                account(),
            )
            .with_previous_uid(Uid::new("u-1000")),
        ),
        ValueKind::Schema => Value::Schema(Schema::with_object_classes(vec![
            ObjectClassInfo::new("__ACCOUNT__")
                .with_attribute(AttributeInfo::new("__NAME__", AttributeType::String).required())
                .with_attribute(
                    AttributeInfo::new("groups", AttributeType::String).multi_valued(),
                ),
            ObjectClassInfo::new("__GROUP__").container(),
        ])),
        ValueKind::ObjectClassInfo => Value::ObjectClassInfo(
            ObjectClassInfo::new("inetOrgPerson")
                .auxiliary()
                .with_attribute(AttributeInfo::new("photo", AttributeType::Bytes).read_only()),
        ),
        ValueKind::AttributeInfo => Value::AttributeInfo(
            AttributeInfo::new("mail", AttributeType::String)
                .with_native_name("mailPrimaryAddress")
                .required()
                .multi_valued(),
        ),
        ValueKind::OperationOptions => Value::OperationOptions(
            OperationOptions::new()
                .with_attributes_to_get(["mail", "cn"])
                .with_page_size(50)
                .with_paged_results_cookie("abc"),
        ),
        ValueKind::ScriptContext => Value::ScriptContext(
            ScriptContext::new("groovy", "return x + 1").with_argument("x", Value::Integer(41)),
        ),
        ValueKind::SearchResult => {
            Value::SearchResult(SearchResult::new().with_paged_results_cookie("next").with_remaining(12))
        }
        ValueKind::ConnectorKey => Value::ConnectorKey(connector_key()),
        ValueKind::Filter(kind) => Value::Filter(filter(kind)),
        ValueKind::QueryFilter(kind) => Value::QueryFilter(query_filter(kind)),
        ValueKind::Error(kind) => Value::Error(error(kind)),
        ValueKind::Message(kind) => Value::Message(message(kind)),
    }
}

/// Values at the edges of their types.
pub fn boundary_values() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Integer(i32::MIN),
        Value::Integer(i32::MAX),
        Value::Long(i64::MIN),
        Value::Long(i64::MAX),
        Value::Float(f32::NAN),
        Value::Float(f32::INFINITY),
        Value::Float(f32::NEG_INFINITY),
        Value::Float(f32::MIN_POSITIVE),
        Value::Float(f32::MAX),
        Value::Float(f32::MIN),
        Value::Double(f64::NAN),
        Value::Double(f64::INFINITY),
        Value::Double(f64::NEG_INFINITY),
        Value::Double(f64::MIN_POSITIVE),
        Value::Double(f64::MAX),
        Value::Double(f64::MIN),
        Value::Double(-0.0),
        Value::from(""),
        Value::from("  padded  "),
        Value::Character(' '),
        Value::Bytes(Vec::new()),
        Value::List(Vec::new()),
        Value::Array(Vec::new()),
        Value::Set(ValueSet::new()),
        Value::Set(ValueSet::case_insensitive()),
        Value::Map(BTreeMap::new()),
        Value::PrimitiveArray(PrimitiveArray::Integer(Vec::new())),
        Value::Attribute(Attribute::empty("empty")),
        Value::Filter(Filter::And(Vec::new())),
    ]
}
