//! Connector Framework schema types
//!
//! Types describing what a target system supports: its object classes and
//! the attributes of each class.

use std::collections::BTreeSet;
use std::fmt;

use crate::objects::{AttributeType, ObjectClass};

/// Schema describing the structure of a target system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// The object classes available in this schema.
    pub object_classes: Vec<ObjectClassInfo>,
}

impl Schema {
    /// Create a new empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema with the given object classes.
    #[must_use]
    pub fn with_object_classes(object_classes: Vec<ObjectClassInfo>) -> Self {
        Self { object_classes }
    }

    /// Add an object class using builder pattern.
    #[must_use]
    pub fn with_object_class(mut self, object_class: ObjectClassInfo) -> Self {
        self.object_classes.push(object_class);
        self
    }

    /// Find an object class by type name (case-insensitive).
    #[must_use]
    pub fn find_object_class(&self, object_class: &ObjectClass) -> Option<&ObjectClassInfo> {
        self.object_classes
            .iter()
            .find(|oc| oc.object_type.eq_ignore_ascii_case(object_class.name()))
    }

    /// Get all object class type names.
    #[must_use]
    pub fn object_class_names(&self) -> Vec<&str> {
        self.object_classes
            .iter()
            .map(|oc| oc.object_type.as_str())
            .collect()
    }
}

/// Description of one object class of a target system.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectClassInfo {
    /// The object class type name (e.g. `__ACCOUNT__`).
    pub object_type: String,

    /// Whether objects of this class may contain other objects.
    pub container: bool,

    /// Whether this is an auxiliary class added on top of a structural one.
    pub auxiliary: bool,

    /// Attributes belonging to this object class.
    pub attributes: Vec<AttributeInfo>,
}

impl ObjectClassInfo {
    /// Create a new structural, non-container object class.
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            container: false,
            auxiliary: false,
            attributes: Vec::new(),
        }
    }

    /// Mark the class as a container.
    #[must_use]
    pub fn container(mut self) -> Self {
        self.container = true;
        self
    }

    /// Mark the class as auxiliary.
    #[must_use]
    pub fn auxiliary(mut self) -> Self {
        self.auxiliary = true;
        self
    }

    /// Add an attribute using builder pattern.
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeInfo) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Find an attribute by name (case-insensitive).
    #[must_use]
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Get all required attributes.
    #[must_use]
    pub fn required_attributes(&self) -> Vec<&AttributeInfo> {
        self.attributes.iter().filter(|a| a.is_required()).collect()
    }

    /// Get the attributes returned when no explicit attribute list is asked for.
    #[must_use]
    pub fn returned_by_default(&self) -> Vec<&AttributeInfo> {
        self.attributes
            .iter()
            .filter(|a| a.is_returned_by_default())
            .collect()
    }
}

/// Behavioral flag of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeFlag {
    Required,
    MultiValued,
    NotCreatable,
    NotUpdateable,
    NotReadable,
    NotReturnedByDefault,
}

impl AttributeFlag {
    /// Get all flags.
    #[must_use]
    pub fn all() -> &'static [AttributeFlag] {
        &[
            AttributeFlag::Required,
            AttributeFlag::MultiValued,
            AttributeFlag::NotCreatable,
            AttributeFlag::NotUpdateable,
            AttributeFlag::NotReadable,
            AttributeFlag::NotReturnedByDefault,
        ]
    }

    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeFlag::Required => "REQUIRED",
            AttributeFlag::MultiValued => "MULTIVALUED",
            AttributeFlag::NotCreatable => "NOT_CREATABLE",
            AttributeFlag::NotUpdateable => "NOT_UPDATEABLE",
            AttributeFlag::NotReadable => "NOT_READABLE",
            AttributeFlag::NotReturnedByDefault => "NOT_RETURNED_BY_DEFAULT",
        }
    }

    /// Parse from string representation.
    #[must_use]
    pub fn parse_str(s: &str) -> Option<Self> {
        AttributeFlag::all().iter().copied().find(|f| f.as_str() == s)
    }
}

impl fmt::Display for AttributeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one attribute of an object class.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    /// Framework-side attribute name.
    pub name: String,

    /// Type of the attribute's values.
    pub value_type: AttributeType,

    /// Name of the attribute in the target system, if different.
    pub native_name: Option<String>,

    /// Behavioral flags.
    pub flags: BTreeSet<AttributeFlag>,
}

impl AttributeInfo {
    /// Create a single-valued, optional, fully writable attribute.
    pub fn new(name: impl Into<String>, value_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            value_type,
            native_name: None,
            flags: BTreeSet::new(),
        }
    }

    /// Set the native name.
    #[must_use]
    pub fn with_native_name(mut self, native_name: impl Into<String>) -> Self {
        self.native_name = Some(native_name.into());
        self
    }

    /// Add a flag.
    #[must_use]
    pub fn with_flag(mut self, flag: AttributeFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Mark as required.
    #[must_use]
    pub fn required(self) -> Self {
        self.with_flag(AttributeFlag::Required)
    }

    /// Mark as multi-valued.
    #[must_use]
    pub fn multi_valued(self) -> Self {
        self.with_flag(AttributeFlag::MultiValued)
    }

    /// Mark as read-only (neither creatable nor updateable).
    #[must_use]
    pub fn read_only(self) -> Self {
        self.with_flag(AttributeFlag::NotCreatable)
            .with_flag(AttributeFlag::NotUpdateable)
    }

    /// Mark as write-only.
    #[must_use]
    pub fn write_only(self) -> Self {
        self.with_flag(AttributeFlag::NotReadable)
            .with_flag(AttributeFlag::NotReturnedByDefault)
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.flags.contains(&AttributeFlag::Required)
    }

    #[must_use]
    pub fn is_multi_valued(&self) -> bool {
        self.flags.contains(&AttributeFlag::MultiValued)
    }

    #[must_use]
    pub fn is_creatable(&self) -> bool {
        !self.flags.contains(&AttributeFlag::NotCreatable)
    }

    #[must_use]
    pub fn is_updateable(&self) -> bool {
        !self.flags.contains(&AttributeFlag::NotUpdateable)
    }

    #[must_use]
    pub fn is_readable(&self) -> bool {
        !self.flags.contains(&AttributeFlag::NotReadable)
    }

    #[must_use]
    pub fn is_returned_by_default(&self) -> bool {
        !self.flags.contains(&AttributeFlag::NotReturnedByDefault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_class() -> ObjectClassInfo {
        ObjectClassInfo::new(ObjectClass::ACCOUNT_NAME)
            .with_attribute(AttributeInfo::new("__NAME__", AttributeType::String).required())
            .with_attribute(
                AttributeInfo::new("email", AttributeType::String).with_native_name("mail"),
            )
            .with_attribute(AttributeInfo::new("groups", AttributeType::String).multi_valued())
            .with_attribute(
                AttributeInfo::new("__PASSWORD__", AttributeType::GuardedString).write_only(),
            )
    }

    #[test]
    fn test_schema_builder() {
        let schema = Schema::new()
            .with_object_class(account_class())
            .with_object_class(ObjectClassInfo::new(ObjectClass::GROUP_NAME).container());

        assert_eq!(schema.object_classes.len(), 2);
        assert_eq!(
            schema.object_class_names(),
            vec!["__ACCOUNT__", "__GROUP__"]
        );
        let account = schema
            .find_object_class(&ObjectClass::new("__account__"))
            .unwrap();
        assert_eq!(account.attributes.len(), 4);
        assert!(schema
            .find_object_class(&ObjectClass::group())
            .unwrap()
            .container);
    }

    #[test]
    fn test_attribute_flags() {
        let account = account_class();
        let name = account.find_attribute("__name__").unwrap();
        assert!(name.is_required());
        assert!(!name.is_multi_valued());

        let groups = account.find_attribute("groups").unwrap();
        assert!(groups.is_multi_valued());
        assert!(groups.is_creatable() && groups.is_updateable());

        let password = account.find_attribute("__PASSWORD__").unwrap();
        assert!(!password.is_readable());
        assert!(!password.is_returned_by_default());

        assert_eq!(account.required_attributes().len(), 1);
        assert_eq!(account.returned_by_default().len(), 3);
    }

    #[test]
    fn test_read_only_attribute() {
        let attr = AttributeInfo::new("createdAt", AttributeType::Long).read_only();
        assert!(!attr.is_creatable());
        assert!(!attr.is_updateable());
        assert!(attr.is_readable());
    }

    #[test]
    fn test_attribute_flag_parsing() {
        for flag in AttributeFlag::all() {
            assert_eq!(AttributeFlag::parse_str(flag.as_str()), Some(*flag));
        }
        assert_eq!(AttributeFlag::parse_str("bogus"), None);
    }
}
