//! # Object Serializer
//!
//! Binary and XML codecs for the idgate value graph.
//!
//! Both codecs are driven by one [`Registry`](registry::Registry) that binds
//! every value kind to a wire id, an XML tag and its encode/decode routines.
//! A value of a kind missing from the registry is refused with
//! [`SerializerError::UnsupportedType`](error::SerializerError).
//!
//! ## Example
//!
//! ```ignore
//! use idgate_serializer::prelude::*;
//!
//! let uid = Value::Uid(Uid::new("42"));
//! let bytes = serialize_to_bytes(&uid)?;
//! assert_eq!(deserialize_from_bytes(&bytes)?, uid);
//!
//! let xml = serialize_to_xml(&uid, false)?;
//! assert_eq!(deserialize_from_xml(&xml, false)?, uid);
//! ```

pub mod binary;
pub mod error;
mod handlers;
pub mod registry;
pub mod util;
pub mod xml;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::binary::{BinaryObjectReader, BinaryObjectWriter, MAX_DECODE_DEPTH};
    pub use crate::error::{SerializerError, SerializerResult};
    pub use crate::registry::{Registry, TypeHandler};
    pub use crate::util::{
        clone_object, deserialize_from_base64, deserialize_from_bytes, deserialize_from_xml,
        serialize_to_base64, serialize_to_bytes, serialize_to_xml,
    };
    pub use crate::xml::{XmlObjectReader, XmlObjectResultsHandler, XmlObjectWriter};

    pub use idgate_connector::prelude::*;
}

pub use util::{
    clone_object, deserialize_from_base64, deserialize_from_bytes, deserialize_from_xml,
    serialize_to_base64, serialize_to_bytes, serialize_to_xml,
};
