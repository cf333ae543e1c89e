//! The framework value graph
//!
//! [`Value`] is the closed set of things that can cross a serialization
//! boundary: primitives, collections and every framework domain object.
//! [`ValueKind`] is its fine-grained runtime type, which the serializer's
//! type registry binds to wire tags.

use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::path::PathBuf;

use num_bigint::BigInt;
use rust_decimal::Decimal;
use url::Url;

use crate::error::{ConnectorError, ErrorKind};
use crate::filter::{Filter, FilterKind};
use crate::objects::{
    Attribute, AttributeValue, ConnectorKey, ConnectorObject, GuardedString, ObjectClass,
    OperationOptions, QualifiedUid, ScriptContext, SearchResult, SyncDelta, SyncToken, Uid,
};
use crate::query::{JsonPointer, QueryFilter, QueryFilterKind};
use crate::remote::{MessageKind, RemoteMessage};
use crate::schema::{AttributeInfo, ObjectClassInfo, Schema};

/// Bitwise float equality: all NaNs are equal, `0.0 != -0.0`.
pub(crate) fn f32_eq(a: f32, b: f32) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

/// Bitwise double equality: all NaNs are equal, `0.0 != -0.0`.
pub(crate) fn f64_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

/// A language/country/variant triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Locale {
    pub language: String,
    pub country: String,
    pub variant: String,
}

impl Locale {
    pub fn new(
        language: impl Into<String>,
        country: impl Into<String>,
        variant: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            country: country.into(),
            variant: variant.into(),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        if !self.country.is_empty() || !self.variant.is_empty() {
            write!(f, "_{}", self.country)?;
        }
        if !self.variant.is_empty() {
            write!(f, "_{}", self.variant)?;
        }
        Ok(())
    }
}

/// An array of primitives, encoded densely without per-element tags.
#[derive(Debug, Clone)]
pub enum PrimitiveArray {
    Boolean(Vec<bool>),
    Character(Vec<char>),
    Integer(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl PrimitiveArray {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            PrimitiveArray::Boolean(v) => v.len(),
            PrimitiveArray::Character(v) => v.len(),
            PrimitiveArray::Integer(v) => v.len(),
            PrimitiveArray::Long(v) => v.len(),
            PrimitiveArray::Float(v) => v.len(),
            PrimitiveArray::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> ValueKind {
        match self {
            PrimitiveArray::Boolean(_) => ValueKind::BooleanArray,
            PrimitiveArray::Character(_) => ValueKind::CharacterArray,
            PrimitiveArray::Integer(_) => ValueKind::IntegerArray,
            PrimitiveArray::Long(_) => ValueKind::LongArray,
            PrimitiveArray::Float(_) => ValueKind::FloatArray,
            PrimitiveArray::Double(_) => ValueKind::DoubleArray,
        }
    }
}

impl PartialEq for PrimitiveArray {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PrimitiveArray::Boolean(a), PrimitiveArray::Boolean(b)) => a == b,
            (PrimitiveArray::Character(a), PrimitiveArray::Character(b)) => a == b,
            (PrimitiveArray::Integer(a), PrimitiveArray::Integer(b)) => a == b,
            (PrimitiveArray::Long(a), PrimitiveArray::Long(b)) => a == b,
            (PrimitiveArray::Float(a), PrimitiveArray::Float(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| f32_eq(*x, *y))
            }
            (PrimitiveArray::Double(a), PrimitiveArray::Double(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| f64_eq(*x, *y))
            }
            _ => false,
        }
    }
}

/// An unordered collection of distinct values.
///
/// A case-insensitive set treats strings differing only in case as the same
/// member. The flag is part of the value and survives serialization.
///
/// Members are indexed by hash, so building a set of `n` values costs `O(n)`
/// comparisons rather than `O(n²)`.
#[derive(Clone, Default)]
pub struct ValueSet {
    values: Vec<Value>,
    case_insensitive: bool,
    index: HashMap<u64, Vec<usize>>,
    state: RandomState,
}

impl ValueSet {
    /// Create an empty set with exact string comparison.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set comparing strings case-insensitively.
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    fn same_member(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::String(x), Value::String(y)) if self.case_insensitive => {
                fold_case(x).eq(fold_case(y))
            }
            _ => a == b,
        }
    }

    fn member_hash(&self, value: &Value) -> u64 {
        self.state.hash_one(Member {
            value,
            case_insensitive: self.case_insensitive,
        })
    }

    fn position(&self, hash: u64, value: &Value) -> Option<usize> {
        self.index
            .get(&hash)?
            .iter()
            .copied()
            .find(|&i| self.same_member(&self.values[i], value))
    }

    /// Check whether an equal member is present.
    pub fn contains(&self, value: &Value) -> bool {
        self.position(self.member_hash(value), value).is_some()
    }

    /// Add a value; returns `false` if an equal member was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        let hash = self.member_hash(&value);
        if self.position(hash, &value).is_some() {
            return false;
        }
        self.index.entry(hash).or_default().push(self.values.len());
        self.values.push(value);
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSet")
            .field("values", &self.values)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.case_insensitive == other.case_insensitive
            && self.len() == other.len()
            && self.values.iter().all(|v| other.contains(v))
    }
}

fn fold_case(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

/// Hash view of a set member that agrees with [`ValueSet`] membership:
/// equal members hash equally. Kinds without a cheap canonical form hash by
/// kind alone and fall back to equality within the bucket.
struct Member<'a> {
    value: &'a Value,
    case_insensitive: bool,
}

impl Hash for Member<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let value = self.value;
        value.kind().hash(state);
        match value {
            Value::Boolean(b) => b.hash(state),
            Value::Character(c) => c.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Long(l) => l.hash(state),
            Value::Float(x) => (!x.is_nan()).then(|| x.to_bits()).hash(state),
            Value::Double(x) => (!x.is_nan()).then(|| x.to_bits()).hash(state),
            Value::String(s) if self.case_insensitive => {
                fold_case(s).for_each(|c| c.hash(state));
            }
            Value::String(s) => s.hash(state),
            Value::BigInteger(b) => b.hash(state),
            Value::BigDecimal(d) if d.is_zero() => {}
            Value::BigDecimal(d) => d.normalize().hash(state),
            Value::Bytes(bytes) => bytes.hash(state),
            Value::Uri(url) => url.as_str().hash(state),
            Value::Locale(locale) => locale.hash(state),
            Value::File(path) => path.hash(state),
            Value::Uid(uid) => uid.hash(state),
            Value::Array(items) | Value::List(items) => {
                items.len().hash(state);
                items.iter().for_each(|item| exact(item).hash(state));
            }
            Value::Map(entries) => {
                entries.len().hash(state);
                for (key, item) in entries {
                    key.hash(state);
                    exact(item).hash(state);
                }
            }
            _ => {}
        }
    }
}

fn exact(value: &Value) -> Member<'_> {
    Member {
        value,
        case_insensitive: false,
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// A node of the framework value graph.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Character(char),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    BigInteger(BigInt),
    BigDecimal(Decimal),
    Bytes(Vec<u8>),
    Uri(Url),
    Locale(Locale),
    File(PathBuf),
    GuardedString(GuardedString),
    PrimitiveArray(PrimitiveArray),
    /// Fixed-size array of heterogeneous values.
    Array(Vec<Value>),
    List(Vec<Value>),
    Set(ValueSet),
    Map(BTreeMap<String, Value>),
    Uid(Uid),
    ObjectClass(ObjectClass),
    Attribute(Attribute),
    ConnectorObject(ConnectorObject),
    QualifiedUid(QualifiedUid),
    SyncToken(SyncToken),
    SyncDelta(SyncDelta),
    Schema(Schema),
    ObjectClassInfo(ObjectClassInfo),
    AttributeInfo(AttributeInfo),
    OperationOptions(OperationOptions),
    ScriptContext(ScriptContext),
    SearchResult(SearchResult),
    ConnectorKey(ConnectorKey),
    Filter(Filter),
    QueryFilter(QueryFilter<JsonPointer>),
    Error(ConnectorError),
    Message(RemoteMessage),
}

/// Runtime type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Null,
    Boolean,
    Character,
    Integer,
    Long,
    Float,
    Double,
    String,
    BigInteger,
    BigDecimal,
    Bytes,
    Uri,
    Locale,
    File,
    GuardedString,
    BooleanArray,
    CharacterArray,
    IntegerArray,
    LongArray,
    FloatArray,
    DoubleArray,
    Array,
    List,
    Set,
    Map,
    Uid,
    ObjectClass,
    Attribute,
    ConnectorObject,
    QualifiedUid,
    SyncToken,
    SyncDelta,
    Schema,
    ObjectClassInfo,
    AttributeInfo,
    OperationOptions,
    ScriptContext,
    SearchResult,
    ConnectorKey,
    Filter(FilterKind),
    QueryFilter(QueryFilterKind),
    Error(ErrorKind),
    Message(MessageKind),
}

impl ValueKind {
    /// Every value kind, including each filter, error and message kind.
    #[must_use]
    pub fn all() -> Vec<ValueKind> {
        let mut kinds = vec![
            ValueKind::Null,
            ValueKind::Boolean,
            ValueKind::Character,
            ValueKind::Integer,
            ValueKind::Long,
            ValueKind::Float,
            ValueKind::Double,
            ValueKind::String,
            ValueKind::BigInteger,
            ValueKind::BigDecimal,
            ValueKind::Bytes,
            ValueKind::Uri,
            ValueKind::Locale,
            ValueKind::File,
            ValueKind::GuardedString,
            ValueKind::BooleanArray,
            ValueKind::CharacterArray,
            ValueKind::IntegerArray,
            ValueKind::LongArray,
            ValueKind::FloatArray,
            ValueKind::DoubleArray,
            ValueKind::Array,
            ValueKind::List,
            ValueKind::Set,
            ValueKind::Map,
            ValueKind::Uid,
            ValueKind::ObjectClass,
            ValueKind::Attribute,
            ValueKind::ConnectorObject,
            ValueKind::QualifiedUid,
            ValueKind::SyncToken,
            ValueKind::SyncDelta,
            ValueKind::Schema,
            ValueKind::ObjectClassInfo,
            ValueKind::AttributeInfo,
            ValueKind::OperationOptions,
            ValueKind::ScriptContext,
            ValueKind::SearchResult,
            ValueKind::ConnectorKey,
        ];
        kinds.extend(FilterKind::all().iter().copied().map(ValueKind::Filter));
        kinds.extend(
            QueryFilterKind::all()
                .iter()
                .copied()
                .map(ValueKind::QueryFilter),
        );
        kinds.extend(ErrorKind::all().iter().copied().map(ValueKind::Error));
        kinds.extend(MessageKind::all().iter().copied().map(ValueKind::Message));
        kinds
    }
}

impl Value {
    /// Get the runtime type of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Character(_) => ValueKind::Character,
            Value::Integer(_) => ValueKind::Integer,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::BigInteger(_) => ValueKind::BigInteger,
            Value::BigDecimal(_) => ValueKind::BigDecimal,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Uri(_) => ValueKind::Uri,
            Value::Locale(_) => ValueKind::Locale,
            Value::File(_) => ValueKind::File,
            Value::GuardedString(_) => ValueKind::GuardedString,
            Value::PrimitiveArray(a) => a.kind(),
            Value::Array(_) => ValueKind::Array,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Uid(_) => ValueKind::Uid,
            Value::ObjectClass(_) => ValueKind::ObjectClass,
            Value::Attribute(_) => ValueKind::Attribute,
            Value::ConnectorObject(_) => ValueKind::ConnectorObject,
            Value::QualifiedUid(_) => ValueKind::QualifiedUid,
            Value::SyncToken(_) => ValueKind::SyncToken,
            Value::SyncDelta(_) => ValueKind::SyncDelta,
            Value::Schema(_) => ValueKind::Schema,
            Value::ObjectClassInfo(_) => ValueKind::ObjectClassInfo,
            Value::AttributeInfo(_) => ValueKind::AttributeInfo,
            Value::OperationOptions(_) => ValueKind::OperationOptions,
            Value::ScriptContext(_) => ValueKind::ScriptContext,
            Value::SearchResult(_) => ValueKind::SearchResult,
            Value::ConnectorKey(_) => ValueKind::ConnectorKey,
            Value::Filter(f) => ValueKind::Filter(f.kind()),
            Value::QueryFilter(f) => ValueKind::QueryFilter(f.kind()),
            Value::Error(e) => ValueKind::Error(e.kind()),
            Value::Message(m) => ValueKind::Message(m.kind()),
        }
    }

    /// Capture any error as a value.
    ///
    /// Framework errors keep their kind. Other errors become a
    /// `RuntimeException` carrying their message and source chain.
    pub fn from_error(error: &(dyn StdError + 'static)) -> Value {
        Value::Error(ConnectorError::from_foreign(error))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Long(l) => i32::try_from(*l).ok(),
            _ => None,
        }
    }

    /// Convert to an attribute value, if this value has an attribute type.
    pub fn to_attribute_value(&self) -> Option<AttributeValue> {
        Some(match self {
            Value::String(s) => AttributeValue::String(s.clone()),
            Value::Integer(i) => AttributeValue::Integer(*i),
            Value::Long(l) => AttributeValue::Long(*l),
            Value::Float(f) => AttributeValue::Float(*f),
            Value::Double(d) => AttributeValue::Double(*d),
            Value::Boolean(b) => AttributeValue::Boolean(*b),
            Value::Character(c) => AttributeValue::Character(*c),
            Value::BigInteger(b) => AttributeValue::BigInteger(b.clone()),
            Value::BigDecimal(d) => AttributeValue::BigDecimal(*d),
            Value::Bytes(b) => AttributeValue::Bytes(b.clone()),
            Value::GuardedString(g) => AttributeValue::GuardedString(g.clone()),
            _ => return None,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => f32_eq(*a, *b),
            (Value::Double(a), Value::Double(b)) => f64_eq(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigInteger(a), Value::BigInteger(b)) => a == b,
            (Value::BigDecimal(a), Value::BigDecimal(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Uri(a), Value::Uri(b)) => a == b,
            (Value::Locale(a), Value::Locale(b)) => a == b,
            (Value::File(a), Value::File(b)) => a == b,
            (Value::GuardedString(a), Value::GuardedString(b)) => a == b,
            (Value::PrimitiveArray(a), Value::PrimitiveArray(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Uid(a), Value::Uid(b)) => a == b,
            (Value::ObjectClass(a), Value::ObjectClass(b)) => a == b,
            (Value::Attribute(a), Value::Attribute(b)) => a == b,
            (Value::ConnectorObject(a), Value::ConnectorObject(b)) => a == b,
            (Value::QualifiedUid(a), Value::QualifiedUid(b)) => a == b,
            (Value::SyncToken(a), Value::SyncToken(b)) => a == b,
            (Value::SyncDelta(a), Value::SyncDelta(b)) => a == b,
            (Value::Schema(a), Value::Schema(b)) => a == b,
            (Value::ObjectClassInfo(a), Value::ObjectClassInfo(b)) => a == b,
            (Value::AttributeInfo(a), Value::AttributeInfo(b)) => a == b,
            (Value::OperationOptions(a), Value::OperationOptions(b)) => a == b,
            (Value::ScriptContext(a), Value::ScriptContext(b)) => a == b,
            (Value::SearchResult(a), Value::SearchResult(b)) => a == b,
            (Value::ConnectorKey(a), Value::ConnectorKey(b)) => a == b,
            (Value::Filter(a), Value::Filter(b)) => a == b,
            (Value::QueryFilter(a), Value::QueryFilter(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a == b,
            _ => false,
        }
    }
}

impl From<AttributeValue> for Value {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::String(s) => Value::String(s),
            AttributeValue::Integer(i) => Value::Integer(i),
            AttributeValue::Long(l) => Value::Long(l),
            AttributeValue::Float(f) => Value::Float(f),
            AttributeValue::Double(d) => Value::Double(d),
            AttributeValue::Boolean(b) => Value::Boolean(b),
            AttributeValue::Character(c) => Value::Character(c),
            AttributeValue::BigInteger(b) => Value::BigInteger(b),
            AttributeValue::BigDecimal(d) => Value::BigDecimal(d),
            AttributeValue::Bytes(b) => Value::Bytes(b),
            AttributeValue::GuardedString(g) => Value::GuardedString(g),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Boolean,
    char => Character,
    i32 => Integer,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    BigInt => BigInteger,
    Decimal => BigDecimal,
    Url => Uri,
    Locale => Locale,
    PathBuf => File,
    GuardedString => GuardedString,
    PrimitiveArray => PrimitiveArray,
    ValueSet => Set,
    BTreeMap<String, Value> => Map,
    Uid => Uid,
    ObjectClass => ObjectClass,
    Attribute => Attribute,
    ConnectorObject => ConnectorObject,
    QualifiedUid => QualifiedUid,
    SyncToken => SyncToken,
    SyncDelta => SyncDelta,
    Schema => Schema,
    ObjectClassInfo => ObjectClassInfo,
    AttributeInfo => AttributeInfo,
    OperationOptions => OperationOptions,
    ScriptContext => ScriptContext,
    SearchResult => SearchResult,
    ConnectorKey => ConnectorKey,
    Filter => Filter,
    QueryFilter<JsonPointer> => QueryFilter,
    ConnectorError => Error,
    RemoteMessage => Message,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_set_contains() {
        let mut set = ValueSet::case_insensitive();
        assert!(set.insert(Value::from("foo")));
        assert!(!set.insert(Value::from("FOO")));
        assert!(set.contains(&Value::from("Foo")));
        assert_eq!(set.len(), 1);

        let exact: ValueSet = [Value::from("foo")].into_iter().collect();
        assert!(!exact.contains(&Value::from("Foo")));
    }

    #[test]
    fn test_large_set_deduplicates() {
        let count = 50_000i64;
        let mut set: ValueSet = (0..count).chain(0..count).map(Value::Long).collect();
        assert_eq!(set.len(), count as usize);
        assert!(set.contains(&Value::Long(count - 1)));
        assert!(!set.contains(&Value::Long(count)));
        assert!(!set.contains(&Value::Integer(0)));
        assert!(!set.insert(Value::Long(123)));

        let firsts: Vec<&Value> = set.iter().take(2).collect();
        assert_eq!(firsts, vec![&Value::Long(0), &Value::Long(1)]);
    }

    #[test]
    fn test_case_insensitive_set_indexes_folded_strings() {
        let mut set = ValueSet::case_insensitive();
        for i in 0..1_000 {
            assert!(set.insert(Value::String(format!("User{i}"))));
        }
        for i in 0..1_000 {
            assert!(!set.insert(Value::String(format!("uSER{i}"))));
        }
        assert_eq!(set.len(), 1_000);
        assert!(set.contains(&Value::from("USER1")));
        assert!(!set.contains(&Value::from("User1000")));
    }

    #[test]
    fn test_set_membership_follows_value_equality() {
        let set: ValueSet = [
            Value::Double(f64::NAN),
            Value::Double(-f64::NAN),
            Value::Double(0.0),
            Value::Double(-0.0),
            Value::BigDecimal(Decimal::new(15, 1)),
            Value::BigDecimal(Decimal::new(150, 2)),
            Value::List(vec![Value::from("a"), Value::Long(1)]),
            Value::List(vec![Value::from("a"), Value::Long(1)]),
            Value::Set(ValueSet::new()),
            Value::Set(ValueSet::new()),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 5);
        assert!(set.contains(&Value::Double(f64::NAN)));
        assert!(set.contains(&Value::BigDecimal(Decimal::new(1500, 3))));
        assert!(!set.contains(&Value::List(vec![Value::from("A"), Value::Long(1)])));
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a: ValueSet = [Value::Integer(1), Value::Integer(2)].into_iter().collect();
        let b: ValueSet = [Value::Integer(2), Value::Integer(1)].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, ValueSet::case_insensitive());
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_eq!(Value::Float(f32::NAN), Value::Float(-f32::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
        assert_eq!(
            Value::PrimitiveArray(PrimitiveArray::Double(vec![f64::NAN, 1.0])),
            Value::PrimitiveArray(PrimitiveArray::Double(vec![f64::NAN, 1.0]))
        );
    }

    #[test]
    fn test_kind_is_fine_grained() {
        assert_eq!(
            Value::PrimitiveArray(PrimitiveArray::Long(vec![])).kind(),
            ValueKind::LongArray
        );
        assert_eq!(
            Value::Error(ConnectorError::timeout("t")).kind(),
            ValueKind::Error(ErrorKind::OperationTimeout)
        );
        assert_eq!(
            Value::Filter(Filter::always_true()).kind(),
            ValueKind::Filter(FilterKind::Boolean)
        );
    }

    #[test]
    fn test_all_kinds_are_distinct() {
        let kinds = ValueKind::all();
        let unique: std::collections::BTreeSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
        assert!(kinds.contains(&ValueKind::Error(ErrorKind::Runtime)));
    }

    #[test]
    fn test_from_error_degrades_foreign_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "custom failure");
        match Value::from_error(&io) {
            Value::Error(e) => {
                assert_eq!(e.kind(), ErrorKind::Runtime);
                assert_eq!(e.message(), "custom failure");
            }
            other => panic!("expected error value, got {other:?}"),
        }
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Long(3));
    }

    #[test]
    fn test_locale_display() {
        assert_eq!(Locale::new("en", "US", "").to_string(), "en_US");
        assert_eq!(Locale::new("fr", "", "").to_string(), "fr");
        assert_eq!(Locale::new("de", "DE", "bavarian").to_string(), "de_DE_bavarian");
    }
}
