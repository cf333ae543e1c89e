//! Standard type handlers
//!
//! Encode and decode routines for every framework value kind, plus the
//! table binding each kind to its wire id and tag. Composite kinds encode as
//! an ordered list of constructor arguments; optional arguments are encoded
//! as `Null`.

use std::borrow::Cow;
use std::path::PathBuf;
use std::str::FromStr;

use idgate_connector::error::{ConnectorError, ErrorKind};
use idgate_connector::filter::{Filter, FilterKind};
use idgate_connector::objects::{
    Attribute, AttributeType, AttributeValue, ConnectorKey, ConnectorObject, GuardedString,
    ObjectClass, OperationOptions, QualifiedUid, ScriptContext, SearchResult, SyncDelta,
    SyncDeltaType, SyncToken, Uid,
};
use idgate_connector::query::{ComparisonOperator, JsonPointer, QueryFilter, QueryFilterKind};
use idgate_connector::remote::{MessageKind, RemoteMessage};
use idgate_connector::schema::{AttributeFlag, AttributeInfo, ObjectClassInfo, Schema};
use idgate_connector::types::ApiOperation;
use idgate_connector::value::{Locale, Value, ValueKind, ValueSet};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use url::Url;

use crate::error::{SerializerError, SerializerResult};
use crate::registry::{Arity, Body, Scalar, ScalarType, Shape, TypeHandler};

/// Extracts the payload of one `Value` variant.
macro_rules! variant {
    ($variant:ident) => {
        |value: Value| match value {
            Value::$variant(inner) => Some(inner),
            _ => None,
        }
    };
}

fn type_name(kind: ValueKind) -> String {
    format!("{kind:?}")
}

fn mismatch(value: &Value) -> SerializerError {
    SerializerError::invalid(type_name(value.kind()), "value does not match its handler")
}

/// Cursor over the constructor arguments of a composite body.
struct Args {
    kind: ValueKind,
    values: std::vec::IntoIter<Value>,
}

impl Args {
    fn new(kind: ValueKind, body: Body<'_>) -> SerializerResult<Self> {
        match body {
            Body::Composite(values) => Ok(Self {
                kind,
                values: values
                    .into_iter()
                    .map(Cow::into_owned)
                    .collect::<Vec<_>>()
                    .into_iter(),
            }),
            _ => Err(SerializerError::invalid(
                type_name(kind),
                "expected constructor arguments",
            )),
        }
    }

    fn error(&self, message: impl Into<String>) -> SerializerError {
        SerializerError::invalid(type_name(self.kind), message)
    }

    fn next(&mut self) -> SerializerResult<Value> {
        self.values
            .next()
            .ok_or_else(|| self.error("missing constructor argument"))
    }

    fn take<T>(&mut self, expected: &str, f: impl FnOnce(Value) -> Option<T>) -> SerializerResult<T> {
        let value = self.next()?;
        let found = value.kind();
        f(value).ok_or_else(|| self.error(format!("expected {expected}, found {found:?}")))
    }

    fn take_opt<T>(
        &mut self,
        expected: &str,
        f: impl FnOnce(Value) -> Option<T>,
    ) -> SerializerResult<Option<T>> {
        let value = self.next()?;
        if value.is_null() {
            return Ok(None);
        }
        let found = value.kind();
        f(value)
            .map(Some)
            .ok_or_else(|| self.error(format!("expected {expected} or null, found {found:?}")))
    }

    fn string(&mut self) -> SerializerResult<String> {
        self.take("String", variant!(String))
    }

    fn rest<T>(self, expected: &str, f: impl Fn(Value) -> Option<T>) -> SerializerResult<Vec<T>> {
        let kind = self.kind;
        self.values
            .map(|value| {
                let found = value.kind();
                f(value).ok_or_else(|| {
                    SerializerError::invalid(
                        type_name(kind),
                        format!("expected {expected}, found {found:?}"),
                    )
                })
            })
            .collect()
    }

    fn parse<T: FromStr>(&self, text: &str, what: &str) -> SerializerResult<T>
    where
        T::Err: std::fmt::Display,
    {
        text.parse()
            .map_err(|e| self.error(format!("invalid {what} '{text}': {e}")))
    }
}

fn composite(args: Vec<Value>) -> SerializerResult<Body<'static>> {
    Ok(Body::Composite(args.into_iter().map(Cow::Owned).collect()))
}

fn optional<T>(value: Option<T>, f: impl FnOnce(T) -> Value) -> Value {
    value.map_or(Value::Null, f)
}

// ============================================================================
// Scalars and primitive arrays
// ============================================================================

fn encode_scalar(value: &Value) -> SerializerResult<Body<'_>> {
    let scalar = match value {
        Value::Null => Scalar::Null,
        Value::Boolean(b) => Scalar::Boolean(*b),
        Value::Character(c) => Scalar::Character(*c),
        Value::Integer(i) => Scalar::Integer(*i),
        Value::Long(l) => Scalar::Long(*l),
        Value::Float(f) => Scalar::Float(*f),
        Value::Double(d) => Scalar::Double(*d),
        Value::String(s) => Scalar::Text(s.clone()),
        Value::BigInteger(b) => Scalar::Text(b.to_string()),
        Value::BigDecimal(d) => Scalar::Text(d.to_string()),
        Value::Bytes(b) => Scalar::Bytes(b.clone()),
        Value::Uri(u) => Scalar::Text(u.to_string()),
        Value::File(path) => match path.to_str() {
            Some(text) => Scalar::Text(text.to_string()),
            None => return Err(SerializerError::invalid("File", "path is not valid UTF-8")),
        },
        Value::GuardedString(g) => Scalar::Text(g.access(str::to_string)),
        Value::ObjectClass(oc) => Scalar::Text(oc.name().to_string()),
        _ => return Err(mismatch(value)),
    };
    Ok(Body::Scalar(scalar))
}

fn decode_scalar(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    let Body::Scalar(scalar) = body else {
        return Err(SerializerError::invalid(type_name(kind), "expected a scalar"));
    };
    let invalid = |message: String| SerializerError::invalid(type_name(kind), message);
    Ok(match (kind, scalar) {
        (ValueKind::Null, Scalar::Null) => Value::Null,
        (ValueKind::Boolean, Scalar::Boolean(b)) => Value::Boolean(b),
        (ValueKind::Character, Scalar::Character(c)) => Value::Character(c),
        (ValueKind::Integer, Scalar::Integer(i)) => Value::Integer(i),
        (ValueKind::Long, Scalar::Long(l)) => Value::Long(l),
        (ValueKind::Float, Scalar::Float(f)) => Value::Float(f),
        (ValueKind::Double, Scalar::Double(d)) => Value::Double(d),
        (ValueKind::String, Scalar::Text(s)) => Value::String(s),
        (ValueKind::BigInteger, Scalar::Text(t)) => Value::BigInteger(
            t.parse::<BigInt>()
                .map_err(|e| invalid(format!("invalid integer '{t}': {e}")))?,
        ),
        (ValueKind::BigDecimal, Scalar::Text(t)) => Value::BigDecimal(
            Decimal::from_str(&t).map_err(|e| invalid(format!("invalid decimal '{t}': {e}")))?,
        ),
        (ValueKind::Bytes, Scalar::Bytes(b)) => Value::Bytes(b),
        (ValueKind::Uri, Scalar::Text(t)) => {
            Value::Uri(Url::parse(&t).map_err(|e| invalid(format!("invalid URI '{t}': {e}")))?)
        }
        (ValueKind::File, Scalar::Text(t)) => Value::File(PathBuf::from(t)),
        (ValueKind::GuardedString, Scalar::Text(t)) => Value::GuardedString(GuardedString::new(t)),
        (ValueKind::ObjectClass, Scalar::Text(t)) => Value::ObjectClass(ObjectClass::new(t)),
        (_, scalar) => {
            return Err(invalid(format!(
                "unexpected {:?} payload",
                scalar.scalar_type()
            )))
        }
    })
}

fn encode_primitive_array(value: &Value) -> SerializerResult<Body<'_>> {
    match value {
        Value::PrimitiveArray(array) => Ok(Body::PrimitiveArray(Cow::Borrowed(array))),
        _ => Err(mismatch(value)),
    }
}

fn decode_primitive_array(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    match body {
        Body::PrimitiveArray(array) => Ok(Value::PrimitiveArray(array.into_owned())),
        _ => Err(SerializerError::invalid(type_name(kind), "expected a primitive array")),
    }
}

// ============================================================================
// Collections
// ============================================================================

fn encode_collection(value: &Value) -> SerializerResult<Body<'_>> {
    match value {
        Value::Locale(locale) => composite(vec![
            Value::String(locale.language.clone()),
            Value::String(locale.country.clone()),
            Value::String(locale.variant.clone()),
        ]),
        Value::Array(items) | Value::List(items) => {
            Ok(Body::Composite(items.iter().map(Cow::Borrowed).collect()))
        }
        Value::Set(set) => {
            let mut args = Vec::with_capacity(set.len() + 1);
            args.push(Cow::Owned(Value::Boolean(set.is_case_insensitive())));
            args.extend(set.iter().map(Cow::Borrowed));
            Ok(Body::Composite(args))
        }
        Value::Map(map) => Ok(Body::Composite(
            map.iter()
                .flat_map(|(k, v)| [Cow::Owned(Value::String(k.clone())), Cow::Borrowed(v)])
                .collect(),
        )),
        _ => Err(mismatch(value)),
    }
}

fn decode_collection(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    let mut args = Args::new(kind, body)?;
    Ok(match kind {
        ValueKind::Locale => {
            let language = args.string()?;
            let country = args.string()?;
            let variant = args.string()?;
            Value::Locale(Locale::new(language, country, variant))
        }
        ValueKind::Array => Value::Array(args.values.collect()),
        ValueKind::List => Value::List(args.values.collect()),
        ValueKind::Set => {
            let mut set = if args.take("Boolean", variant!(Boolean))? {
                ValueSet::case_insensitive()
            } else {
                ValueSet::new()
            };
            for member in args.values {
                set.insert(member);
            }
            Value::Set(set)
        }
        ValueKind::Map => decode_map(args)?,
        _ => return Err(args.error("not a collection kind")),
    })
}

fn decode_map(mut args: Args) -> SerializerResult<Value> {
    if args.values.len() % 2 != 0 {
        return Err(args.error("map needs an even number of arguments"));
    }
    let mut map = std::collections::BTreeMap::new();
    while args.values.len() > 0 {
        let key = args.string()?;
        let value = args.next()?;
        map.insert(key, value);
    }
    Ok(Value::Map(map))
}

fn attribute_value(args: &Args, value: Value) -> SerializerResult<AttributeValue> {
    let found = value.kind();
    value
        .to_attribute_value()
        .ok_or_else(|| args.error(format!("{found:?} is not an attribute value type")))
}

// ============================================================================
// Connector objects
// ============================================================================

fn encode_object(value: &Value) -> SerializerResult<Body<'_>> {
    match value {
        Value::Uid(uid) => composite(vec![
            Value::String(uid.value().to_string()),
            optional(uid.revision(), |r| Value::String(r.to_string())),
        ]),
        Value::Attribute(attribute) => {
            let mut args = Vec::with_capacity(attribute.values().len() + 1);
            args.push(Value::String(attribute.name().to_string()));
            args.extend(attribute.values().iter().cloned().map(Value::from));
            composite(args)
        }
        Value::ConnectorObject(object) => {
            let mut args = vec![
                Value::ObjectClass(object.object_class().clone()),
                Value::Uid(object.uid().clone()),
            ];
            args.extend(object.attributes().cloned().map(Value::Attribute));
            composite(args)
        }
        Value::QualifiedUid(q) => composite(vec![
            Value::ObjectClass(q.object_class.clone()),
            Value::Uid(q.uid.clone()),
        ]),
        Value::SyncToken(token) => composite(vec![Value::from(token.value().clone())]),
        Value::SyncDelta(delta) => composite(vec![
            Value::SyncToken(delta.token.clone()),
            Value::String(delta.delta_type.as_str().to_string()),
            optional(delta.previous_uid.clone(), Value::Uid),
            optional(delta.object_class.clone(), Value::ObjectClass),
            Value::Uid(delta.uid.clone()),
            optional(delta.object.clone(), Value::ConnectorObject),
        ]),
        Value::OperationOptions(options) => composite(vec![Value::Map(options.as_map().clone())]),
        Value::ScriptContext(script) => composite(vec![
            Value::String(script.language.clone()),
            Value::String(script.text.clone()),
            Value::Map(script.arguments.clone()),
        ]),
        Value::SearchResult(result) => composite(vec![
            optional(result.paged_results_cookie.clone(), Value::String),
            Value::Integer(result.remaining_paged_results),
        ]),
        Value::ConnectorKey(key) => composite(vec![
            Value::String(key.bundle_name.clone()),
            Value::String(key.bundle_version.clone()),
            Value::String(key.connector_name.clone()),
        ]),
        _ => Err(mismatch(value)),
    }
}

fn decode_object(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    let mut args = Args::new(kind, body)?;
    Ok(match kind {
        ValueKind::Uid => {
            let value = args.string()?;
            let revision = args.take_opt("String", variant!(String))?;
            Value::Uid(uid_with_revision(value, revision))
        }
        ValueKind::Attribute => Value::Attribute(decode_attribute(args)?),
        ValueKind::ConnectorObject => {
            let object_class = args.take("ObjectClass", variant!(ObjectClass))?;
            let uid = args.take("Uid", variant!(Uid))?;
            let attributes = args.rest("Attribute", variant!(Attribute))?;
            let object = attributes
                .into_iter()
                .fold(
                    ConnectorObject::builder(object_class).with_uid(uid),
                    |builder, attribute| builder.with_attribute(attribute),
                )
                .build()
                .map_err(|e| SerializerError::invalid("ConnectorObject", e.to_string()))?;
            Value::ConnectorObject(object)
        }
        ValueKind::QualifiedUid => {
            let object_class = args.take("ObjectClass", variant!(ObjectClass))?;
            let uid = args.take("Uid", variant!(Uid))?;
            Value::QualifiedUid(QualifiedUid::new(object_class, uid))
        }
        ValueKind::SyncToken => {
            let value = args.next()?;
            Value::SyncToken(SyncToken::new(attribute_value(&args, value)?))
        }
        ValueKind::SyncDelta => {
            let token = args.take("SyncToken", variant!(SyncToken))?;
            let delta_type = args.string()?;
            let delta_type: SyncDeltaType = args.parse(&delta_type, "delta type")?;
            let previous_uid = args.take_opt("Uid", variant!(Uid))?;
            let object_class = args.take_opt("ObjectClass", variant!(ObjectClass))?;
            let uid = args.take("Uid", variant!(Uid))?;
            let object = args.take_opt("ConnectorObject", variant!(ConnectorObject))?;
            Value::SyncDelta(SyncDelta {
                token,
                delta_type,
                previous_uid,
                object_class,
                uid,
                object,
            })
        }
        ValueKind::OperationOptions => Value::OperationOptions(OperationOptions::from_map(
            args.take("Map", variant!(Map))?,
        )),
        ValueKind::ScriptContext => {
            let language = args.string()?;
            let text = args.string()?;
            let arguments = args.take("Map", variant!(Map))?;
            let mut script = ScriptContext::new(language, text);
            script.arguments = arguments;
            Value::ScriptContext(script)
        }
        ValueKind::SearchResult => {
            let cookie = args.take_opt("String", variant!(String))?;
            let remaining = args.take("Integer", variant!(Integer))?;
            let mut result = SearchResult::new().with_remaining(remaining);
            result.paged_results_cookie = cookie;
            Value::SearchResult(result)
        }
        ValueKind::ConnectorKey => {
            let bundle_name = args.string()?;
            let bundle_version = args.string()?;
            let connector_name = args.string()?;
            Value::ConnectorKey(ConnectorKey::new(bundle_name, bundle_version, connector_name))
        }
        _ => return Err(args.error("not an object kind")),
    })
}

fn uid_with_revision(value: String, revision: Option<String>) -> Uid {
    match revision {
        Some(revision) => Uid::new(value).with_revision(revision),
        None => Uid::new(value),
    }
}

fn decode_attribute(mut args: Args) -> SerializerResult<Attribute> {
    let name = args.string()?;
    let mut values = Vec::with_capacity(args.values.len());
    while args.values.len() > 0 {
        let value = args.next()?;
        values.push(attribute_value(&args, value)?);
    }
    Ok(Attribute::new(name, values))
}

// ============================================================================
// Schema
// ============================================================================

fn encode_schema(value: &Value) -> SerializerResult<Body<'_>> {
    match value {
        Value::Schema(schema) => composite(
            schema
                .object_classes
                .iter()
                .cloned()
                .map(Value::ObjectClassInfo)
                .collect(),
        ),
        Value::ObjectClassInfo(info) => {
            let mut args = vec![
                Value::String(info.object_type.clone()),
                Value::Boolean(info.container),
                Value::Boolean(info.auxiliary),
            ];
            args.extend(info.attributes.iter().cloned().map(Value::AttributeInfo));
            composite(args)
        }
        Value::AttributeInfo(info) => {
            let mut args = vec![
                Value::String(info.name.clone()),
                Value::String(info.value_type.as_str().to_string()),
                optional(info.native_name.clone(), Value::String),
            ];
            args.extend(
                info.flags
                    .iter()
                    .map(|flag| Value::String(flag.as_str().to_string())),
            );
            composite(args)
        }
        _ => Err(mismatch(value)),
    }
}

fn decode_schema(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    let mut args = Args::new(kind, body)?;
    Ok(match kind {
        ValueKind::Schema => Value::Schema(Schema::with_object_classes(
            args.rest("ObjectClassInfo", variant!(ObjectClassInfo))?,
        )),
        ValueKind::ObjectClassInfo => {
            let mut info = ObjectClassInfo::new(args.string()?);
            info.container = args.take("Boolean", variant!(Boolean))?;
            info.auxiliary = args.take("Boolean", variant!(Boolean))?;
            info.attributes = args.rest("AttributeInfo", variant!(AttributeInfo))?;
            Value::ObjectClassInfo(info)
        }
        ValueKind::AttributeInfo => {
            let name = args.string()?;
            let value_type_name = args.string()?;
            let value_type = AttributeType::parse_str(&value_type_name).ok_or_else(|| {
                args.error(format!("unknown attribute type '{value_type_name}'"))
            })?;
            let mut info = AttributeInfo::new(name, value_type);
            info.native_name = args.take_opt("String", variant!(String))?;
            let kind = args.kind;
            for flag in args.rest("String", variant!(String))? {
                let flag = AttributeFlag::parse_str(&flag).ok_or_else(|| {
                    SerializerError::invalid(type_name(kind), format!("unknown flag '{flag}'"))
                })?;
                info.flags.insert(flag);
            }
            Value::AttributeInfo(info)
        }
        _ => return Err(args.error("not a schema kind")),
    })
}

// ============================================================================
// Filters
// ============================================================================

fn encode_filter(value: &Value) -> SerializerResult<Body<'_>> {
    let Value::Filter(filter) = value else {
        return Err(mismatch(value));
    };
    let args = match filter {
        Filter::And(children) | Filter::Or(children) => {
            children.iter().cloned().map(Value::Filter).collect()
        }
        Filter::Not(child) => vec![Value::Filter((**child).clone())],
        Filter::BooleanLiteral(b) => vec![Value::Boolean(*b)],
        Filter::Present(name) => vec![Value::String(name.clone())],
        Filter::ExtendedMatch {
            operator,
            attribute,
        } => vec![
            Value::String(operator.clone()),
            Value::Attribute(attribute.clone()),
        ],
        leaf => match leaf.attribute() {
            Some(attribute) => vec![Value::Attribute(attribute.clone())],
            None => return Err(mismatch(value)),
        },
    };
    composite(args)
}

fn decode_filter(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    let ValueKind::Filter(filter_kind) = kind else {
        return Err(SerializerError::invalid(type_name(kind), "not a filter kind"));
    };
    let mut args = Args::new(kind, body)?;
    let filter = match filter_kind {
        FilterKind::And => Filter::And(args.rest("Filter", variant!(Filter))?),
        FilterKind::Or => Filter::Or(args.rest("Filter", variant!(Filter))?),
        FilterKind::Not => Filter::Not(Box::new(args.take("Filter", variant!(Filter))?)),
        FilterKind::Boolean => Filter::BooleanLiteral(args.take("Boolean", variant!(Boolean))?),
        FilterKind::Present => Filter::Present(args.string()?),
        FilterKind::ExtendedMatch => {
            let operator = args.string()?;
            let attribute = args.take("Attribute", variant!(Attribute))?;
            Filter::ExtendedMatch {
                operator,
                attribute,
            }
        }
        leaf => {
            let attribute = args.take("Attribute", variant!(Attribute))?;
            match leaf {
                FilterKind::Equals => Filter::Equals(attribute),
                FilterKind::Contains => Filter::Contains(attribute),
                FilterKind::StartsWith => Filter::StartsWith(attribute),
                FilterKind::EndsWith => Filter::EndsWith(attribute),
                FilterKind::GreaterThan => Filter::GreaterThan(attribute),
                FilterKind::GreaterThanOrEqual => Filter::GreaterThanOrEqual(attribute),
                FilterKind::LessThan => Filter::LessThan(attribute),
                FilterKind::LessThanOrEqual => Filter::LessThanOrEqual(attribute),
                _ => Filter::ContainsAllValues(attribute),
            }
        }
    };
    Ok(Value::Filter(filter))
}

fn encode_query_filter(value: &Value) -> SerializerResult<Body<'_>> {
    let Value::QueryFilter(filter) = value else {
        return Err(mismatch(value));
    };
    let args = match filter {
        QueryFilter::And(children) | QueryFilter::Or(children) => {
            children.iter().cloned().map(Value::QueryFilter).collect()
        }
        QueryFilter::Not(child) => vec![Value::QueryFilter((**child).clone())],
        QueryFilter::BooleanLiteral(b) => vec![Value::Boolean(*b)],
        QueryFilter::Comparison {
            field,
            operator,
            value,
        } => vec![
            Value::String(field.to_string()),
            Value::String(operator.name().to_string()),
            Value::from(value.clone()),
        ],
        QueryFilter::Present { field } => vec![Value::String(field.to_string())],
    };
    composite(args)
}

fn decode_query_filter(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    let ValueKind::QueryFilter(filter_kind) = kind else {
        return Err(SerializerError::invalid(type_name(kind), "not a query filter kind"));
    };
    let mut args = Args::new(kind, body)?;
    let filter = match filter_kind {
        QueryFilterKind::And => QueryFilter::And(args.rest("QueryFilter", variant!(QueryFilter))?),
        QueryFilterKind::Or => QueryFilter::Or(args.rest("QueryFilter", variant!(QueryFilter))?),
        QueryFilterKind::Not => {
            QueryFilter::Not(Box::new(args.take("QueryFilter", variant!(QueryFilter))?))
        }
        QueryFilterKind::Boolean => {
            QueryFilter::BooleanLiteral(args.take("Boolean", variant!(Boolean))?)
        }
        QueryFilterKind::Comparison => {
            let pointer = args.string()?;
            let field: JsonPointer = args.parse(&pointer, "field pointer")?;
            let operator = ComparisonOperator::from_name(&args.string()?);
            let value = args.next()?;
            let value = attribute_value(&args, value)?;
            QueryFilter::Comparison {
                field,
                operator,
                value,
            }
        }
        QueryFilterKind::Present => {
            let pointer = args.string()?;
            QueryFilter::Present {
                field: args.parse(&pointer, "field pointer")?,
            }
        }
    };
    Ok(Value::QueryFilter(filter))
}

// ============================================================================
// Errors
// ============================================================================

fn error_arity(kind: ErrorKind) -> Arity {
    match kind {
        ErrorKind::UnknownUid => Arity::Exact(4),
        ErrorKind::AlreadyExists | ErrorKind::PasswordExpired => Arity::Exact(3),
        _ => Arity::Exact(2),
    }
}

fn encode_error(value: &Value) -> SerializerResult<Body<'_>> {
    let Value::Error(error) = value else {
        return Err(mismatch(value));
    };
    let mut args = vec![
        Value::String(error.message().to_string()),
        optional(error.cause().cloned(), Value::Error),
    ];
    match error_arity(error.kind()) {
        Arity::Exact(4) => {
            args.push(optional(error.uid().cloned(), Value::Uid));
            args.push(optional(error.object_class().cloned(), Value::ObjectClass));
        }
        Arity::Exact(3) => args.push(optional(error.uid().cloned(), Value::Uid)),
        _ => {}
    }
    composite(args)
}

fn decode_error(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    let ValueKind::Error(error_kind) = kind else {
        return Err(SerializerError::invalid(type_name(kind), "not an error kind"));
    };
    let mut args = Args::new(kind, body)?;
    let message = args.string()?;
    let cause = args.take_opt("Error", variant!(Error))?;
    let mut error = ConnectorError::new(error_kind, message, cause);
    if args.values.len() > 0 {
        if let Some(uid) = args.take_opt("Uid", variant!(Uid))? {
            error = error.with_uid(uid);
        }
    }
    if args.values.len() > 0 {
        if let Some(object_class) = args.take_opt("ObjectClass", variant!(ObjectClass))? {
            error = error.with_object_class(object_class);
        }
    }
    Ok(Value::Error(error))
}

// ============================================================================
// Remote messages
// ============================================================================

fn message_arity(kind: MessageKind) -> Arity {
    match kind {
        MessageKind::HelloRequest => Arity::Exact(1),
        MessageKind::HelloResponse | MessageKind::OperationResponsePart => Arity::Exact(2),
        MessageKind::OperationRequest => Arity::Exact(3),
        MessageKind::OperationResponseEnd
        | MessageKind::OperationResponsePause
        | MessageKind::OperationRequestMoreData
        | MessageKind::OperationRequestStopData => Arity::Exact(0),
    }
}

fn encode_message(value: &Value) -> SerializerResult<Body<'_>> {
    let Value::Message(message) = value else {
        return Err(mismatch(value));
    };
    let args = match message {
        RemoteMessage::OperationResponsePart { error, result } => {
            return Ok(Body::Composite(vec![
                Cow::Owned(optional(error.clone(), Value::Error)),
                Cow::Borrowed(&**result),
            ]));
        }
        RemoteMessage::HelloRequest { info_level } => vec![Value::Integer(*info_level)],
        RemoteMessage::HelloResponse {
            error,
            connector_keys,
        } => vec![
            optional(error.clone(), Value::Error),
            Value::List(connector_keys.iter().cloned().map(Value::ConnectorKey).collect()),
        ],
        RemoteMessage::OperationRequest {
            connector_key,
            operation,
            arguments,
        } => vec![
            Value::ConnectorKey(connector_key.clone()),
            Value::String(operation.as_str().to_string()),
            Value::List(arguments.clone()),
        ],
        RemoteMessage::OperationResponseEnd
        | RemoteMessage::OperationResponsePause
        | RemoteMessage::OperationRequestMoreData
        | RemoteMessage::OperationRequestStopData => Vec::new(),
    };
    composite(args)
}

fn decode_message(kind: ValueKind, body: Body<'_>) -> SerializerResult<Value> {
    let ValueKind::Message(message_kind) = kind else {
        return Err(SerializerError::invalid(type_name(kind), "not a message kind"));
    };
    let mut args = Args::new(kind, body)?;
    let message = match message_kind {
        MessageKind::HelloRequest => RemoteMessage::HelloRequest {
            info_level: args.take("Integer", variant!(Integer))?,
        },
        MessageKind::HelloResponse => {
            let error = args.take_opt("Error", variant!(Error))?;
            let keys = args.take("List", variant!(List))?;
            let connector_keys = keys
                .into_iter()
                .map(|key| match key {
                    Value::ConnectorKey(key) => Ok(key),
                    other => Err(args.error(format!(
                        "expected ConnectorKey, found {:?}",
                        other.kind()
                    ))),
                })
                .collect::<SerializerResult<Vec<_>>>()?;
            RemoteMessage::HelloResponse {
                error,
                connector_keys,
            }
        }
        MessageKind::OperationRequest => {
            let connector_key = args.take("ConnectorKey", variant!(ConnectorKey))?;
            let operation = args.string()?;
            let operation: ApiOperation = args.parse(&operation, "operation")?;
            let arguments = args.take("List", variant!(List))?;
            RemoteMessage::OperationRequest {
                connector_key,
                operation,
                arguments,
            }
        }
        MessageKind::OperationResponsePart => {
            let error = args.take_opt("Error", variant!(Error))?;
            let result = args.next()?;
            RemoteMessage::OperationResponsePart {
                error,
                result: Box::new(result),
            }
        }
        MessageKind::OperationResponseEnd => RemoteMessage::OperationResponseEnd,
        MessageKind::OperationResponsePause => RemoteMessage::OperationResponsePause,
        MessageKind::OperationRequestMoreData => RemoteMessage::OperationRequestMoreData,
        MessageKind::OperationRequestStopData => RemoteMessage::OperationRequestStopData,
    };
    Ok(Value::Message(message))
}

// ============================================================================
// Table
// ============================================================================

fn filter_entry(kind: FilterKind) -> (u16, &'static str) {
    match kind {
        FilterKind::And => (0x0100, "AndFilter"),
        FilterKind::Or => (0x0101, "OrFilter"),
        FilterKind::Not => (0x0102, "NotFilter"),
        FilterKind::Boolean => (0x0103, "BooleanFilter"),
        FilterKind::Equals => (0x0104, "EqualsFilter"),
        FilterKind::Contains => (0x0105, "ContainsFilter"),
        FilterKind::StartsWith => (0x0106, "StartsWithFilter"),
        FilterKind::EndsWith => (0x0107, "EndsWithFilter"),
        FilterKind::GreaterThan => (0x0108, "GreaterThanFilter"),
        FilterKind::GreaterThanOrEqual => (0x0109, "GreaterThanOrEqualFilter"),
        FilterKind::LessThan => (0x010A, "LessThanFilter"),
        FilterKind::LessThanOrEqual => (0x010B, "LessThanOrEqualFilter"),
        FilterKind::ContainsAllValues => (0x010C, "ContainsAllValuesFilter"),
        FilterKind::Present => (0x010D, "PresenceFilter"),
        FilterKind::ExtendedMatch => (0x010E, "ExtendedMatchFilter"),
    }
}

fn filter_arity(kind: FilterKind) -> Arity {
    match kind {
        FilterKind::And | FilterKind::Or => Arity::AtLeast(0),
        FilterKind::ExtendedMatch => Arity::Exact(2),
        _ => Arity::Exact(1),
    }
}

fn query_filter_entry(kind: QueryFilterKind) -> (u16, &'static str, Arity) {
    match kind {
        QueryFilterKind::And => (0x0140, "AndQueryFilter", Arity::AtLeast(0)),
        QueryFilterKind::Or => (0x0141, "OrQueryFilter", Arity::AtLeast(0)),
        QueryFilterKind::Not => (0x0142, "NotQueryFilter", Arity::Exact(1)),
        QueryFilterKind::Boolean => (0x0143, "BooleanQueryFilter", Arity::Exact(1)),
        QueryFilterKind::Comparison => (0x0144, "ComparisonQueryFilter", Arity::Exact(3)),
        QueryFilterKind::Present => (0x0145, "PresenceQueryFilter", Arity::Exact(1)),
    }
}

fn error_entry(kind: ErrorKind) -> (u16, &'static str) {
    match kind {
        ErrorKind::Connector => (0x0200, "ConnectorException"),
        ErrorKind::ConnectorIo => (0x0201, "ConnectorIOException"),
        ErrorKind::ConnectionFailed => (0x0202, "ConnectionFailedException"),
        ErrorKind::ConnectionBroken => (0x0203, "ConnectionBrokenException"),
        ErrorKind::OperationTimeout => (0x0204, "OperationTimeoutException"),
        ErrorKind::AlreadyExists => (0x0205, "AlreadyExistsException"),
        ErrorKind::UnknownUid => (0x0206, "UnknownUidException"),
        ErrorKind::InvalidAttributeValue => (0x0207, "InvalidAttributeValueException"),
        ErrorKind::InvalidCredential => (0x0208, "InvalidCredentialException"),
        ErrorKind::InvalidPassword => (0x0209, "InvalidPasswordException"),
        ErrorKind::PasswordExpired => (0x020A, "PasswordExpiredException"),
        ErrorKind::PermissionDenied => (0x020B, "PermissionDeniedException"),
        ErrorKind::ConnectorSecurity => (0x020C, "ConnectorSecurityException"),
        ErrorKind::Configuration => (0x020D, "ConfigurationException"),
        ErrorKind::PreconditionFailed => (0x020E, "PreconditionFailedException"),
        ErrorKind::PreconditionRequired => (0x020F, "PreconditionRequiredException"),
        ErrorKind::Retryable => (0x0210, "RetryableException"),
        ErrorKind::UnsupportedOperation => (0x0211, "UnsupportedOperationException"),
        ErrorKind::IllegalArgument => (0x0212, "IllegalArgumentException"),
        ErrorKind::IllegalState => (0x0213, "IllegalStateException"),
        ErrorKind::Runtime => (0x0214, "RuntimeException"),
    }
}

fn message_entry(kind: MessageKind) -> (u16, &'static str) {
    match kind {
        MessageKind::HelloRequest => (0x0300, "HelloRequest"),
        MessageKind::HelloResponse => (0x0301, "HelloResponse"),
        MessageKind::OperationRequest => (0x0302, "OperationRequest"),
        MessageKind::OperationResponsePart => (0x0303, "OperationResponsePart"),
        MessageKind::OperationResponseEnd => (0x0304, "OperationResponseEnd"),
        MessageKind::OperationResponsePause => (0x0305, "OperationResponsePause"),
        MessageKind::OperationRequestMoreData => (0x0306, "OperationRequestMoreData"),
        MessageKind::OperationRequestStopData => (0x0307, "OperationRequestStopData"),
    }
}

/// The standard registry table.
pub(crate) fn standard_handlers() -> Vec<TypeHandler> {
    use Shape::{Composite, PrimitiveArray, Scalar as S};
    use ValueKind as K;

    let scalar =
        |id, tag, kind, t| TypeHandler::new(id, tag, kind, S(t), encode_scalar, decode_scalar);
    let array = |id, tag, kind, t| {
        TypeHandler::new(
            id,
            tag,
            kind,
            PrimitiveArray(t),
            encode_primitive_array,
            decode_primitive_array,
        )
    };
    let collection = |id, tag, kind, arity| {
        TypeHandler::new(id, tag, kind, Composite(arity), encode_collection, decode_collection)
    };
    let object = |id, tag, kind, arity| {
        TypeHandler::new(id, tag, kind, Composite(arity), encode_object, decode_object)
    };
    let schema = |id, tag, kind, arity| {
        TypeHandler::new(id, tag, kind, Composite(arity), encode_schema, decode_schema)
    };

    let mut handlers = vec![
        scalar(0x0001, "null", K::Null, ScalarType::Null),
        scalar(0x0002, "Boolean", K::Boolean, ScalarType::Boolean),
        scalar(0x0003, "Character", K::Character, ScalarType::Character),
        scalar(0x0004, "Integer", K::Integer, ScalarType::Integer),
        scalar(0x0005, "Long", K::Long, ScalarType::Long),
        scalar(0x0006, "Float", K::Float, ScalarType::Float),
        scalar(0x0007, "Double", K::Double, ScalarType::Double),
        scalar(0x0008, "String", K::String, ScalarType::Text),
        scalar(0x0009, "BigInteger", K::BigInteger, ScalarType::Text),
        scalar(0x000A, "BigDecimal", K::BigDecimal, ScalarType::Text),
        scalar(0x000B, "ByteArray", K::Bytes, ScalarType::Bytes),
        scalar(0x000C, "URI", K::Uri, ScalarType::Text),
        collection(0x000D, "Locale", K::Locale, Arity::Exact(3)),
        scalar(0x000E, "File", K::File, ScalarType::Text),
        scalar(0x000F, "GuardedString", K::GuardedString, ScalarType::Text),
        array(0x0010, "booleanArray", K::BooleanArray, ScalarType::Boolean),
        array(0x0011, "charArray", K::CharacterArray, ScalarType::Character),
        array(0x0012, "intArray", K::IntegerArray, ScalarType::Integer),
        array(0x0013, "longArray", K::LongArray, ScalarType::Long),
        array(0x0014, "floatArray", K::FloatArray, ScalarType::Float),
        array(0x0015, "doubleArray", K::DoubleArray, ScalarType::Double),
        collection(0x0020, "Array", K::Array, Arity::AtLeast(0)),
        collection(0x0021, "List", K::List, Arity::AtLeast(0)),
        collection(0x0022, "Set", K::Set, Arity::AtLeast(1)),
        collection(0x0023, "Map", K::Map, Arity::AtLeast(0)),
        object(0x0030, "Uid", K::Uid, Arity::Exact(2)),
        scalar(0x0031, "ObjectClass", K::ObjectClass, ScalarType::Text),
        object(0x0032, "Attribute", K::Attribute, Arity::AtLeast(1)),
        object(0x0033, "ConnectorObject", K::ConnectorObject, Arity::AtLeast(2)),
        object(0x0034, "QualifiedUid", K::QualifiedUid, Arity::Exact(2)),
        object(0x0035, "SyncToken", K::SyncToken, Arity::Exact(1)),
        object(0x0036, "SyncDelta", K::SyncDelta, Arity::Exact(6)),
        schema(0x0037, "Schema", K::Schema, Arity::AtLeast(0)),
        schema(0x0038, "ObjectClassInfo", K::ObjectClassInfo, Arity::AtLeast(3)),
        schema(0x0039, "AttributeInfo", K::AttributeInfo, Arity::AtLeast(3)),
        object(0x003A, "OperationOptions", K::OperationOptions, Arity::Exact(1)),
        object(0x003B, "ScriptContext", K::ScriptContext, Arity::Exact(3)),
        object(0x003C, "SearchResult", K::SearchResult, Arity::Exact(2)),
        object(0x003D, "ConnectorKey", K::ConnectorKey, Arity::Exact(3)),
    ];

    handlers.extend(FilterKind::all().iter().map(|&kind| {
        let (id, tag) = filter_entry(kind);
        TypeHandler::new(
            id,
            tag,
            K::Filter(kind),
            Composite(filter_arity(kind)),
            encode_filter,
            decode_filter,
        )
    }));
    handlers.extend(QueryFilterKind::all().iter().map(|&kind| {
        let (id, tag, arity) = query_filter_entry(kind);
        TypeHandler::new(
            id,
            tag,
            K::QueryFilter(kind),
            Composite(arity),
            encode_query_filter,
            decode_query_filter,
        )
    }));
    handlers.extend(ErrorKind::all().iter().map(|&kind| {
        let (id, tag) = error_entry(kind);
        TypeHandler::new(
            id,
            tag,
            K::Error(kind),
            Composite(error_arity(kind)),
            encode_error,
            decode_error,
        )
    }));
    handlers.extend(MessageKind::all().iter().map(|&kind| {
        let (id, tag) = message_entry(kind);
        TypeHandler::new(
            id,
            tag,
            K::Message(kind),
            Composite(message_arity(kind)),
            encode_message,
            decode_message,
        )
    }));
    handlers
}
