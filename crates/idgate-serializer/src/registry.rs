//! Type registry
//!
//! One table binds every [`ValueKind`] to a stable numeric id (binary wire
//! format), a stable tag name (XML element name) and the routines converting
//! a value to and from its [`Body`]. Both codecs consult the same table, so
//! adding a type is a one-place change.
//!
//! Ids and tags are a wire contract: entries may be added, never renumbered
//! or renamed.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use idgate_connector::value::{PrimitiveArray, Value, ValueKind};

use crate::error::{SerializerError, SerializerResult};
use crate::handlers;

/// Payload type of a scalar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// No payload.
    Null,
    Boolean,
    Character,
    Integer,
    Long,
    Float,
    Double,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
}

/// A scalar payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Character(char),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Null => ScalarType::Null,
            Scalar::Boolean(_) => ScalarType::Boolean,
            Scalar::Character(_) => ScalarType::Character,
            Scalar::Integer(_) => ScalarType::Integer,
            Scalar::Long(_) => ScalarType::Long,
            Scalar::Float(_) => ScalarType::Float,
            Scalar::Double(_) => ScalarType::Double,
            Scalar::Text(_) => ScalarType::Text,
            Scalar::Bytes(_) => ScalarType::Bytes,
        }
    }
}

/// Number of constructor arguments a composite entry takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    /// Check whether `count` arguments are acceptable.
    #[must_use]
    pub fn admits(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Wire shape of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single scalar payload.
    Scalar(ScalarType),
    /// A length-prefixed run of untagged primitives.
    PrimitiveArray(ScalarType),
    /// Constructor arguments, each a tagged value.
    Composite(Arity),
}

/// The content of one encoded value, between its tag and the next value.
///
/// Encoding borrows arrays and child values from the value being written
/// where it can; decoding always yields owned content.
#[derive(Debug, Clone, PartialEq)]
pub enum Body<'a> {
    Scalar(Scalar),
    PrimitiveArray(Cow<'a, PrimitiveArray>),
    Composite(Vec<Cow<'a, Value>>),
}

fn array_element_type(array: &PrimitiveArray) -> ScalarType {
    match array {
        PrimitiveArray::Boolean(_) => ScalarType::Boolean,
        PrimitiveArray::Character(_) => ScalarType::Character,
        PrimitiveArray::Integer(_) => ScalarType::Integer,
        PrimitiveArray::Long(_) => ScalarType::Long,
        PrimitiveArray::Float(_) => ScalarType::Float,
        PrimitiveArray::Double(_) => ScalarType::Double,
    }
}

pub type Encoder = for<'a> fn(&'a Value) -> SerializerResult<Body<'a>>;
pub type Decoder = fn(ValueKind, Body<'_>) -> SerializerResult<Value>;

/// Registry entry for one value kind.
#[derive(Debug, Clone)]
pub struct TypeHandler {
    id: u16,
    tag: &'static str,
    kind: ValueKind,
    shape: Shape,
    encoder: Encoder,
    decoder: Decoder,
}

impl TypeHandler {
    pub fn new(
        id: u16,
        tag: &'static str,
        kind: ValueKind,
        shape: Shape,
        encoder: Encoder,
        decoder: Decoder,
    ) -> Self {
        Self {
            id,
            tag,
            kind,
            shape,
            encoder,
            decoder,
        }
    }

    /// Binary wire id.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// XML element name.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Convert `value` into its body.
    pub fn encode<'a>(&self, value: &'a Value) -> SerializerResult<Body<'a>> {
        let body = (self.encoder)(value)?;
        self.check(&body)?;
        Ok(body)
    }

    /// Rebuild a value from its body, validating the body against the shape.
    pub fn decode(&self, body: Body<'_>) -> SerializerResult<Value> {
        self.check(&body)?;
        (self.decoder)(self.kind, body)
    }

    fn check(&self, body: &Body<'_>) -> SerializerResult<()> {
        let fits = match (self.shape, body) {
            (Shape::Scalar(expected), Body::Scalar(scalar)) => scalar.scalar_type() == expected,
            (Shape::PrimitiveArray(expected), Body::PrimitiveArray(array)) => {
                array_element_type(array) == expected
            }
            (Shape::Composite(arity), Body::Composite(args)) => {
                if !arity.admits(args.len()) {
                    return Err(SerializerError::invalid(
                        self.tag,
                        format!("expected {arity} arguments, found {}", args.len()),
                    ));
                }
                true
            }
            _ => false,
        };
        if fits {
            Ok(())
        } else {
            Err(SerializerError::invalid(
                self.tag,
                format!("body does not match shape {:?}", self.shape),
            ))
        }
    }
}

/// The table of type handlers.
///
/// Read-only once built; the standard registry is shared by every codec call.
#[derive(Debug, Default)]
pub struct Registry {
    handlers: Vec<TypeHandler>,
    by_kind: HashMap<ValueKind, usize>,
    by_tag: HashMap<&'static str, usize>,
    by_id: HashMap<u16, usize>,
}

static STANDARD: LazyLock<Registry> = LazyLock::new(|| {
    Registry::from_handlers(handlers::standard_handlers())
        .expect("standard type handlers have unique kinds, tags and ids")
});

impl Registry {
    /// The registry of every framework value kind.
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    /// Every handler of the standard registry, for building custom registries.
    pub fn standard_handlers() -> Vec<TypeHandler> {
        handlers::standard_handlers()
    }

    /// Build a registry from a list of handlers.
    pub fn from_handlers(
        handlers: impl IntoIterator<Item = TypeHandler>,
    ) -> SerializerResult<Registry> {
        let mut registry = Registry::default();
        for handler in handlers {
            registry.register(handler)?;
        }
        Ok(registry)
    }

    /// Add a handler. Kinds, tags and ids must be unique.
    pub fn register(&mut self, handler: TypeHandler) -> SerializerResult<()> {
        if self.by_kind.contains_key(&handler.kind)
            || self.by_tag.contains_key(handler.tag)
            || self.by_id.contains_key(&handler.id)
        {
            return Err(SerializerError::invalid(
                handler.tag,
                format!("duplicate registration of {:?} (id {})", handler.kind, handler.id),
            ));
        }
        let index = self.handlers.len();
        self.by_kind.insert(handler.kind, index);
        self.by_tag.insert(handler.tag, index);
        self.by_id.insert(handler.id, index);
        self.handlers.push(handler);
        Ok(())
    }

    /// Handler encoding values of `kind`.
    pub fn handler_for(&self, kind: ValueKind) -> SerializerResult<&TypeHandler> {
        self.by_kind
            .get(&kind)
            .map(|&i| &self.handlers[i])
            .ok_or_else(|| SerializerError::unsupported(format!("{kind:?}")))
    }

    /// Handler for an XML element name.
    pub fn handler_for_tag(&self, tag: &str) -> SerializerResult<&TypeHandler> {
        self.by_tag
            .get(tag)
            .map(|&i| &self.handlers[i])
            .ok_or_else(|| SerializerError::unsupported(tag))
    }

    /// Handler for a binary wire id.
    pub fn handler_for_id(&self, id: u16) -> SerializerResult<&TypeHandler> {
        self.by_id
            .get(&id)
            .map(|&i| &self.handlers[i])
            .ok_or_else(|| SerializerError::unsupported(format!("type id {id:#06x}")))
    }

    /// Iterate over all handlers in registration order.
    pub fn handlers(&self) -> impl Iterator<Item = &TypeHandler> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_covers_every_kind() {
        let registry = Registry::standard();
        for kind in ValueKind::all() {
            let handler = registry.handler_for(kind).unwrap();
            assert_eq!(handler.kind(), kind);
            assert_eq!(registry.handler_for_tag(handler.tag()).unwrap().kind(), kind);
            assert_eq!(registry.handler_for_id(handler.id()).unwrap().kind(), kind);
        }
        assert_eq!(registry.len(), ValueKind::all().len());
    }

    #[test]
    fn test_missing_kind_is_unsupported() {
        let registry = Registry::from_handlers(
            Registry::standard_handlers()
                .into_iter()
                .filter(|h| h.kind() != ValueKind::Uid),
        )
        .unwrap();

        match registry.handler_for(ValueKind::Uid) {
            Err(SerializerError::UnsupportedType { type_name }) => assert_eq!(type_name, "Uid"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(registry.handler_for_tag("Widget").is_err());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::default();
        let handler = Registry::standard().handler_for(ValueKind::Long).unwrap().clone();
        registry.register(handler.clone()).unwrap();
        assert!(registry.register(handler).is_err());
    }

    #[test]
    fn test_arity_is_validated() {
        let handler = Registry::standard().handler_for(ValueKind::Uid).unwrap();
        let err = handler.decode(Body::Composite(Vec::new())).unwrap_err();
        assert!(matches!(err, SerializerError::InvalidContent { .. }));
    }

    #[test]
    fn test_shape_mismatch_is_invalid_content() {
        let handler = Registry::standard().handler_for(ValueKind::Long).unwrap();
        let err = handler
            .decode(Body::Scalar(Scalar::Text("1".to_string())))
            .unwrap_err();
        assert!(matches!(err, SerializerError::InvalidContent { .. }));
    }

    #[test]
    fn test_arity_admits() {
        assert!(Arity::Exact(2).admits(2));
        assert!(!Arity::Exact(2).admits(3));
        assert!(Arity::AtLeast(1).admits(5));
        assert!(!Arity::AtLeast(1).admits(0));
    }
}
