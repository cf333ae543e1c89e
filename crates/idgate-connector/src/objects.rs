//! Connector Framework object types
//!
//! UIDs, attributes, connector objects, sync deltas, scripts and operation
//! options: the values that flow between the caller and a connector.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use zeroize::Zeroize;

use crate::error::{ConnectorError, ConnectorResult};
use crate::value::{f32_eq, f64_eq, Value};

/// A secret string (typically a password).
///
/// The clear text is wiped from memory when the value is dropped and never
/// shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct GuardedString(String);

impl GuardedString {
    /// Wrap a clear-text secret.
    pub fn new(clear_text: impl Into<String>) -> Self {
        Self(clear_text.into())
    }

    /// Run `f` with access to the clear text.
    pub fn access<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.0)
    }

    /// Check whether the secret equals `candidate`.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Debug for GuardedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GuardedString(****)")
    }
}

impl Drop for GuardedString {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// A single value of an attribute.
///
/// The variants are the closed set of attribute types a connector may
/// return or accept.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    String(String),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Character(char),
    BigInteger(BigInt),
    BigDecimal(Decimal),
    Bytes(Vec<u8>),
    GuardedString(GuardedString),
}

/// The type of an attribute value, used in schema descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeType {
    String,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Character,
    BigInteger,
    BigDecimal,
    Bytes,
    GuardedString,
}

impl AttributeType {
    /// Get all supported attribute types.
    #[must_use]
    pub fn all() -> &'static [AttributeType] {
        &[
            AttributeType::String,
            AttributeType::Integer,
            AttributeType::Long,
            AttributeType::Float,
            AttributeType::Double,
            AttributeType::Boolean,
            AttributeType::Character,
            AttributeType::BigInteger,
            AttributeType::BigDecimal,
            AttributeType::Bytes,
            AttributeType::GuardedString,
        ]
    }

    /// Get the string representation of this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Integer => "integer",
            AttributeType::Long => "long",
            AttributeType::Float => "float",
            AttributeType::Double => "double",
            AttributeType::Boolean => "boolean",
            AttributeType::Character => "character",
            AttributeType::BigInteger => "big_integer",
            AttributeType::BigDecimal => "big_decimal",
            AttributeType::Bytes => "bytes",
            AttributeType::GuardedString => "guarded_string",
        }
    }

    /// Parse from string representation.
    #[must_use]
    pub fn parse_str(s: &str) -> Option<Self> {
        AttributeType::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Numeric {
    Integral(BigInt),
    Decimal(Decimal),
    Floating(f64),
}

impl AttributeValue {
    /// Get the type of this value.
    #[must_use]
    pub fn value_type(&self) -> AttributeType {
        match self {
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::Integer(_) => AttributeType::Integer,
            AttributeValue::Long(_) => AttributeType::Long,
            AttributeValue::Float(_) => AttributeType::Float,
            AttributeValue::Double(_) => AttributeType::Double,
            AttributeValue::Boolean(_) => AttributeType::Boolean,
            AttributeValue::Character(_) => AttributeType::Character,
            AttributeValue::BigInteger(_) => AttributeType::BigInteger,
            AttributeValue::BigDecimal(_) => AttributeType::BigDecimal,
            AttributeValue::Bytes(_) => AttributeType::Bytes,
            AttributeValue::GuardedString(_) => AttributeType::GuardedString,
        }
    }

    /// Get as a string if this is a string value.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer if this is an integral value that fits in `i64`.
    #[must_use]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(i64::from(*i)),
            AttributeValue::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            AttributeValue::Integer(i) => Some(Numeric::Integral(BigInt::from(*i))),
            AttributeValue::Long(l) => Some(Numeric::Integral(BigInt::from(*l))),
            AttributeValue::BigInteger(b) => Some(Numeric::Integral(b.clone())),
            AttributeValue::BigDecimal(d) => Some(Numeric::Decimal(*d)),
            AttributeValue::Float(f) => Some(Numeric::Floating(f64::from(*f))),
            AttributeValue::Double(d) => Some(Numeric::Floating(*d)),
            _ => None,
        }
    }

    /// Compare two values by their natural ordering.
    ///
    /// Numbers compare numerically regardless of width, strings and
    /// characters lexically, booleans with `false < true`. Returns `None` when
    /// the two values have no common ordering.
    #[must_use]
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::String(a), AttributeValue::String(b)) => Some(a.cmp(b)),
            (AttributeValue::Character(a), AttributeValue::Character(b)) => Some(a.cmp(b)),
            (AttributeValue::Boolean(a), AttributeValue::Boolean(b)) => Some(a.cmp(b)),
            _ => compare_numeric(self.numeric()?, other.numeric()?),
        }
    }
}

fn compare_numeric(left: Numeric, right: Numeric) -> Option<Ordering> {
    match (left, right) {
        (Numeric::Integral(a), Numeric::Integral(b)) => Some(a.cmp(&b)),
        (Numeric::Decimal(a), Numeric::Decimal(b)) => Some(a.cmp(&b)),
        (Numeric::Decimal(a), Numeric::Integral(b)) => match Decimal::from_str(&b.to_string()) {
            Ok(b) => Some(a.cmp(&b)),
            Err(_) => a.to_f64()?.partial_cmp(&bigint_to_f64(&b)?),
        },
        (Numeric::Integral(a), Numeric::Decimal(b)) => {
            compare_numeric(Numeric::Decimal(b), Numeric::Integral(a)).map(Ordering::reverse)
        }
        (left, right) => to_f64(left)?.partial_cmp(&to_f64(right)?),
    }
}

fn to_f64(n: Numeric) -> Option<f64> {
    match n {
        Numeric::Integral(b) => bigint_to_f64(&b),
        Numeric::Decimal(d) => d.to_f64(),
        Numeric::Floating(f) => Some(f),
    }
}

fn bigint_to_f64(b: &BigInt) -> Option<f64> {
    b.to_string().parse().ok()
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttributeValue::String(a), AttributeValue::String(b)) => a == b,
            (AttributeValue::Integer(a), AttributeValue::Integer(b)) => a == b,
            (AttributeValue::Long(a), AttributeValue::Long(b)) => a == b,
            (AttributeValue::Float(a), AttributeValue::Float(b)) => f32_eq(*a, *b),
            (AttributeValue::Double(a), AttributeValue::Double(b)) => f64_eq(*a, *b),
            (AttributeValue::Boolean(a), AttributeValue::Boolean(b)) => a == b,
            (AttributeValue::Character(a), AttributeValue::Character(b)) => a == b,
            (AttributeValue::BigInteger(a), AttributeValue::BigInteger(b)) => a == b,
            (AttributeValue::BigDecimal(a), AttributeValue::BigDecimal(b)) => a == b,
            (AttributeValue::Bytes(a), AttributeValue::Bytes(b)) => a == b,
            (AttributeValue::GuardedString(a), AttributeValue::GuardedString(b)) => a == b,
            _ => false,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Long(i)
    }
}

impl From<f32> for AttributeValue {
    fn from(f: f32) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Double(f)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<char> for AttributeValue {
    fn from(c: char) -> Self {
        AttributeValue::Character(c)
    }
}

impl From<BigInt> for AttributeValue {
    fn from(b: BigInt) -> Self {
        AttributeValue::BigInteger(b)
    }
}

impl From<Decimal> for AttributeValue {
    fn from(d: Decimal) -> Self {
        AttributeValue::BigDecimal(d)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Bytes(bytes)
    }
}

impl From<GuardedString> for AttributeValue {
    fn from(g: GuardedString) -> Self {
        AttributeValue::GuardedString(g)
    }
}

/// A named, possibly multi-valued attribute.
///
/// Attribute names compare case-insensitively.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    values: Vec<AttributeValue>,
}

impl Attribute {
    /// Name of the attribute holding the object's UID.
    pub const UID: &'static str = "__UID__";
    /// Name of the attribute holding the object's user-friendly name.
    pub const NAME: &'static str = "__NAME__";
    /// Name of the attribute holding the object's password.
    pub const PASSWORD: &'static str = "__PASSWORD__";
    /// Name of the attribute holding the object's enabled flag.
    pub const ENABLE: &'static str = "__ENABLE__";

    /// Create an attribute with the given values.
    pub fn new(name: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Create a single-valued attribute.
    pub fn single(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::new(name, vec![value.into()])
    }

    /// Create an attribute with no values.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Get the attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get all values.
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Check whether this attribute has the given name (case-insensitive).
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Get the only value of a single-valued attribute.
    ///
    /// Returns `None` for an attribute without values and an error if the
    /// attribute holds more than one value.
    pub fn single_value(&self) -> ConnectorResult<Option<&AttributeValue>> {
        match self.values.as_slice() {
            [] => Ok(None),
            [value] => Ok(Some(value)),
            _ => Err(ConnectorError::illegal_argument(format!(
                "attribute '{}' must be single-valued",
                self.name
            ))),
        }
    }

    /// Consume the attribute into its name and values.
    pub fn into_parts(self) -> (String, Vec<AttributeValue>) {
        (self.name, self.values)
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.is(&other.name) && self.values == other.values
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.name, self.values)
    }
}

/// Unique identifier for an object in a target system.
///
/// The optional revision supports optimistic concurrency on systems that
/// version their objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uid {
    value: String,
    revision: Option<String>,
}

impl Uid {
    /// Create a new UID with the given value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            revision: None,
        }
    }

    /// Set the revision of this UID.
    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the revision, if any.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Represent this UID as the `__UID__` attribute.
    #[must_use]
    pub fn to_attribute(&self) -> Attribute {
        Attribute::single(Attribute::UID, self.value.as_str())
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// User-friendly, possibly non-unique identifier of an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(String);

impl Name {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    /// Represent this name as the `__NAME__` attribute.
    #[must_use]
    pub fn to_attribute(&self) -> Attribute {
        Attribute::single(Attribute::NAME, self.0.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The type of an object in a target system (account, group, ...).
///
/// Object class names compare case-insensitively.
#[derive(Debug, Clone, Eq)]
pub struct ObjectClass(String);

impl ObjectClass {
    /// Object class of user accounts.
    pub const ACCOUNT_NAME: &'static str = "__ACCOUNT__";
    /// Object class of groups.
    pub const GROUP_NAME: &'static str = "__GROUP__";
    /// Pseudo object class matching every class (used by sync).
    pub const ALL_NAME: &'static str = "__ALL__";

    /// Create an object class with the given type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The account object class.
    #[must_use]
    pub fn account() -> Self {
        Self::new(Self::ACCOUNT_NAME)
    }

    /// The group object class.
    #[must_use]
    pub fn group() -> Self {
        Self::new(Self::GROUP_NAME)
    }

    /// The pseudo object class matching every class.
    #[must_use]
    pub fn all() -> Self {
        Self::new(Self::ALL_NAME)
    }

    /// Get the type name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Check whether this is the pseudo class matching every class.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::ALL_NAME)
    }
}

impl PartialEq for ObjectClass {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An object read from or written to a target system.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorObject {
    object_class: ObjectClass,
    uid: Uid,
    /// Keyed by lower-cased attribute name.
    attributes: BTreeMap<String, Attribute>,
}

impl ConnectorObject {
    /// Start building a connector object.
    pub fn builder(object_class: ObjectClass) -> ConnectorObjectBuilder {
        ConnectorObjectBuilder::new(object_class)
    }

    /// Get the object class.
    pub fn object_class(&self) -> &ObjectClass {
        &self.object_class
    }

    /// Get the UID.
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Get the value of the `__NAME__` attribute.
    pub fn name(&self) -> Option<&str> {
        self.attribute_by_name(Attribute::NAME)
            .and_then(|a| a.values().first())
            .and_then(AttributeValue::as_string)
    }

    /// Find an attribute by name (case-insensitive).
    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(&name.to_lowercase())
    }

    /// Iterate over all attributes, including `__UID__` and `__NAME__`.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check whether the object carries no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Keep only the named attributes (plus `__UID__` and `__NAME__`).
    #[must_use]
    pub fn retain_attributes(mut self, names: &[String]) -> Self {
        self.attributes.retain(|key, attr| {
            attr.is(Attribute::UID)
                || attr.is(Attribute::NAME)
                || names.iter().any(|n| n.to_lowercase() == *key)
        });
        self
    }
}

/// Builder for [`ConnectorObject`].
#[derive(Debug, Clone)]
pub struct ConnectorObjectBuilder {
    object_class: ObjectClass,
    uid: Option<Uid>,
    attributes: BTreeMap<String, Attribute>,
}

impl ConnectorObjectBuilder {
    /// Create a builder for the given object class.
    pub fn new(object_class: ObjectClass) -> Self {
        Self {
            object_class,
            uid: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the UID.
    #[must_use]
    pub fn with_uid(mut self, uid: Uid) -> Self {
        self.attributes
            .insert(Attribute::UID.to_lowercase(), uid.to_attribute());
        self.uid = Some(uid);
        self
    }

    /// Set the user-friendly name.
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_attribute(Attribute::single(Attribute::NAME, name.into()))
    }

    /// Add an attribute, replacing any attribute of the same name.
    ///
    /// A `__UID__` attribute sets the UID.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        if attribute.is(Attribute::UID) {
            if let Some(AttributeValue::String(value)) = attribute.values().first() {
                if self.uid.as_ref().map(Uid::value) != Some(value.as_str()) {
                    self.uid = Some(Uid::new(value.clone()));
                }
            }
        }
        self.attributes
            .insert(attribute.name().to_lowercase(), attribute);
        self
    }

    /// Set an attribute from a name and a single value.
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.with_attribute(Attribute::single(name, value))
    }

    /// Build the object.
    ///
    /// Fails if no UID was set. A missing `__NAME__` defaults to the UID value.
    pub fn build(mut self) -> ConnectorResult<ConnectorObject> {
        let uid = self.uid.take().ok_or_else(|| {
            ConnectorError::illegal_argument("connector object requires a __UID__")
        })?;
        self.attributes
            .entry(Attribute::NAME.to_lowercase())
            .or_insert_with(|| Attribute::single(Attribute::NAME, uid.value()));
        Ok(ConnectorObject {
            object_class: self.object_class,
            uid,
            attributes: self.attributes,
        })
    }
}

/// A UID qualified with its object class.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedUid {
    pub object_class: ObjectClass,
    pub uid: Uid,
}

impl QualifiedUid {
    pub fn new(object_class: ObjectClass, uid: Uid) -> Self {
        Self { object_class, uid }
    }
}

/// Opaque position in a target system's change log.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncToken(AttributeValue);

impl SyncToken {
    pub fn new(value: impl Into<AttributeValue>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &AttributeValue {
        &self.0
    }
}

/// Type of change detected during synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncDeltaType {
    /// A new object was created.
    Create,
    /// An existing object was updated.
    Update,
    /// The object was created or updated; the source cannot tell which.
    CreateOrUpdate,
    /// An object was deleted.
    Delete,
}

impl SyncDeltaType {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDeltaType::Create => "CREATE",
            SyncDeltaType::Update => "UPDATE",
            SyncDeltaType::CreateOrUpdate => "CREATE_OR_UPDATE",
            SyncDeltaType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for SyncDeltaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDeltaType {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(SyncDeltaType::Create),
            "UPDATE" => Ok(SyncDeltaType::Update),
            "CREATE_OR_UPDATE" => Ok(SyncDeltaType::CreateOrUpdate),
            "DELETE" => Ok(SyncDeltaType::Delete),
            _ => Err(ConnectorError::illegal_argument(format!(
                "invalid sync delta type '{s}'"
            ))),
        }
    }
}

/// A detected change from a target system during synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncDelta {
    /// Position of this change in the change log.
    pub token: SyncToken,
    /// The type of change.
    pub delta_type: SyncDeltaType,
    /// The UID the object had before a rename, if it changed.
    pub previous_uid: Option<Uid>,
    /// The object class of the changed object.
    pub object_class: Option<ObjectClass>,
    /// The unique identifier of the changed object.
    pub uid: Uid,
    /// The current state of the object (absent for deletes).
    pub object: Option<ConnectorObject>,
}

impl SyncDelta {
    /// Create a delta for a created or updated object.
    pub fn upserted(token: SyncToken, delta_type: SyncDeltaType, object: ConnectorObject) -> Self {
        Self {
            token,
            delta_type,
            previous_uid: None,
            object_class: Some(object.object_class().clone()),
            uid: object.uid().clone(),
            object: Some(object),
        }
    }

    /// Create a delta for a deleted object.
    pub fn deleted(token: SyncToken, object_class: ObjectClass, uid: Uid) -> Self {
        Self {
            token,
            delta_type: SyncDeltaType::Delete,
            previous_uid: None,
            object_class: Some(object_class),
            uid,
            object: None,
        }
    }

    /// Record the UID the object had before this change.
    #[must_use]
    pub fn with_previous_uid(mut self, previous_uid: Uid) -> Self {
        self.previous_uid = Some(previous_uid);
        self
    }
}

/// A script together with the arguments it is invoked with.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptContext {
    pub language: String,
    pub text: String,
    pub arguments: BTreeMap<String, Value>,
}

impl ScriptContext {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Add a script argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

/// Options passed along with an API operation.
///
/// A string-keyed option map with typed accessors for the well-known options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationOptions {
    options: BTreeMap<String, Value>,
}

impl OperationOptions {
    /// Names of the attributes to return from search and get.
    pub const ATTRIBUTES_TO_GET: &'static str = "ATTRS_TO_GET";
    /// Number of results per page.
    pub const PAGE_SIZE: &'static str = "PAGE_SIZE";
    /// Cookie of the page to resume from.
    pub const PAGED_RESULTS_COOKIE: &'static str = "PAGED_RESULTS_COOKIE";
    /// Offset of the first result to return.
    pub const PAGED_RESULTS_OFFSET: &'static str = "PAGED_RESULTS_OFFSET";

    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options from a raw option map.
    pub fn from_map(options: BTreeMap<String, Value>) -> Self {
        Self { options }
    }

    /// Set an option.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Set the attributes to return.
    #[must_use]
    pub fn with_attributes_to_get<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(|n| Value::String(n.into()))
            .collect();
        self.with(Self::ATTRIBUTES_TO_GET, Value::List(names))
    }

    /// Set the page size.
    #[must_use]
    pub fn with_page_size(self, page_size: i32) -> Self {
        self.with(Self::PAGE_SIZE, Value::Integer(page_size))
    }

    /// Set the paged results cookie.
    #[must_use]
    pub fn with_paged_results_cookie(self, cookie: impl Into<String>) -> Self {
        self.with(Self::PAGED_RESULTS_COOKIE, Value::String(cookie.into()))
    }

    /// Set the paged results offset.
    #[must_use]
    pub fn with_paged_results_offset(self, offset: i32) -> Self {
        self.with(Self::PAGED_RESULTS_OFFSET, Value::Integer(offset))
    }

    /// Get a raw option.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Get the raw option map.
    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    /// Get the attributes to return, if restricted.
    pub fn attributes_to_get(&self) -> Option<Vec<String>> {
        match self.options.get(Self::ATTRIBUTES_TO_GET)? {
            Value::List(items) | Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Get the page size.
    pub fn page_size(&self) -> Option<i32> {
        self.options.get(Self::PAGE_SIZE).and_then(Value::as_i32)
    }

    /// Get the paged results cookie.
    pub fn paged_results_cookie(&self) -> Option<&str> {
        self.options
            .get(Self::PAGED_RESULTS_COOKIE)
            .and_then(Value::as_str)
    }

    /// Get the paged results offset.
    pub fn paged_results_offset(&self) -> Option<i32> {
        self.options
            .get(Self::PAGED_RESULTS_OFFSET)
            .and_then(Value::as_i32)
    }
}

/// Result of a search operation.
///
/// The objects themselves are streamed to a results handler; this carries
/// only the paging state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Cookie for the next page (if more results available).
    pub paged_results_cookie: Option<String>,
    /// Number of results remaining, or `-1` if unknown.
    pub remaining_paged_results: i32,
}

impl SearchResult {
    /// Create a search result with no paging state.
    pub fn new() -> Self {
        Self {
            paged_results_cookie: None,
            remaining_paged_results: -1,
        }
    }

    /// Set the next cursor.
    #[must_use]
    pub fn with_paged_results_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.paged_results_cookie = Some(cookie.into());
        self
    }

    /// Set the number of remaining results.
    #[must_use]
    pub fn with_remaining(mut self, remaining: i32) -> Self {
        self.remaining_paged_results = remaining;
        self
    }

    /// Check whether more pages are available.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.paged_results_cookie.is_some()
    }
}

impl Default for SearchResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies a connector implementation inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectorKey {
    pub bundle_name: String,
    pub bundle_version: String,
    pub connector_name: String,
}

impl ConnectorKey {
    pub fn new(
        bundle_name: impl Into<String>,
        bundle_version: impl Into<String>,
        connector_name: impl Into<String>,
    ) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            bundle_version: bundle_version.into(),
            connector_name: connector_name.into(),
        }
    }
}

impl fmt::Display for ConnectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.bundle_name, self.bundle_version, self.connector_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_object() -> ConnectorObject {
        ConnectorObject::builder(ObjectClass::account())
            .with_uid(Uid::new("u-1"))
            .with_name("bob")
            .with("email", "bob@example.com")
            .with("age", 30i64)
            .build()
            .unwrap()
    }

    #[test]
    fn test_uid_creation() {
        let uid = Uid::new("cn=john,ou=users,dc=example,dc=com").with_revision("7");
        assert_eq!(uid.value(), "cn=john,ou=users,dc=example,dc=com");
        assert_eq!(uid.revision(), Some("7"));
        assert_eq!(uid.to_string(), "cn=john,ou=users,dc=example,dc=com");
    }

    #[test]
    fn test_connector_object_lookup_is_case_insensitive() {
        let object = sample_object();
        assert_eq!(object.uid().value(), "u-1");
        assert_eq!(object.name(), Some("bob"));
        assert!(object.attribute_by_name("EMAIL").is_some());
        assert!(object.attribute_by_name("__uid__").is_some());
        assert!(object.attribute_by_name("nonexistent").is_none());
    }

    #[test]
    fn test_builder_requires_uid_and_defaults_name() {
        let err = ConnectorObject::builder(ObjectClass::account())
            .with_name("x")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IllegalArgument);

        let object = ConnectorObject::builder(ObjectClass::group())
            .with_uid(Uid::new("g-1"))
            .build()
            .unwrap();
        assert_eq!(object.name(), Some("g-1"));
    }

    #[test]
    fn test_retain_attributes_keeps_identity() {
        let object = sample_object().retain_attributes(&["email".to_string()]);
        assert!(object.attribute_by_name("email").is_some());
        assert!(object.attribute_by_name("age").is_none());
        assert!(object.attribute_by_name(Attribute::UID).is_some());
        assert!(object.attribute_by_name(Attribute::NAME).is_some());
    }

    #[test]
    fn test_attribute_equality_ignores_name_case() {
        assert_eq!(
            Attribute::single("Email", "a@b.c"),
            Attribute::single("email", "a@b.c")
        );
        assert_ne!(
            Attribute::single("email", "a@b.c"),
            Attribute::single("email", "x@b.c")
        );
    }

    #[test]
    fn test_single_value_rejects_multi_valued() {
        let attr = Attribute::new("groups", vec!["a".into(), "b".into()]);
        assert!(attr.single_value().is_err());
        assert_eq!(Attribute::empty("x").single_value().unwrap(), None);
    }

    #[test]
    fn test_compare_across_numeric_widths() {
        let small = AttributeValue::Integer(21);
        let large = AttributeValue::Long(30);
        assert_eq!(small.compare(&large), Some(Ordering::Less));
        assert_eq!(
            AttributeValue::Double(21.5).compare(&AttributeValue::Integer(21)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            AttributeValue::BigDecimal(Decimal::new(2100, 2)).compare(&AttributeValue::Long(21)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            AttributeValue::BigInteger(BigInt::from(5)).compare(&AttributeValue::Long(4)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_incompatible_types() {
        assert_eq!(
            AttributeValue::String("1".into()).compare(&AttributeValue::Integer(1)),
            None
        );
        assert_eq!(
            AttributeValue::Bytes(vec![1]).compare(&AttributeValue::Bytes(vec![1])),
            None
        );
    }

    #[test]
    fn test_nan_values_are_equal() {
        assert_eq!(AttributeValue::Double(f64::NAN), AttributeValue::Double(f64::NAN));
        assert_ne!(AttributeValue::Double(0.0), AttributeValue::Double(-0.0));
    }

    #[test]
    fn test_guarded_string_redacts_debug() {
        let secret = GuardedString::new("s3cret");
        assert_eq!(format!("{secret:?}"), "GuardedString(****)");
        assert!(secret.verify("s3cret"));
        assert_eq!(secret.access(str::len), 6);
    }

    #[test]
    fn test_operation_options_accessors() {
        let options = OperationOptions::new()
            .with_attributes_to_get(["email", "age"])
            .with_page_size(50)
            .with_paged_results_cookie("c1")
            .with_paged_results_offset(10);

        assert_eq!(
            options.attributes_to_get(),
            Some(vec!["email".to_string(), "age".to_string()])
        );
        assert_eq!(options.page_size(), Some(50));
        assert_eq!(options.paged_results_cookie(), Some("c1"));
        assert_eq!(options.paged_results_offset(), Some(10));
    }

    #[test]
    fn test_sync_delta_type_parsing() {
        for t in [
            SyncDeltaType::Create,
            SyncDeltaType::Update,
            SyncDeltaType::CreateOrUpdate,
            SyncDeltaType::Delete,
        ] {
            assert_eq!(t.as_str().parse::<SyncDeltaType>().unwrap(), t);
        }
        assert!("bogus".parse::<SyncDeltaType>().is_err());
    }

    #[test]
    fn test_search_result() {
        let result = SearchResult::new()
            .with_paged_results_cookie("cursor_abc")
            .with_remaining(100);
        assert!(result.has_more());
        assert_eq!(result.remaining_paged_results, 100);
        assert!(!SearchResult::default().has_more());
    }
}
