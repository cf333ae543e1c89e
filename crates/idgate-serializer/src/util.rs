//! One-call helpers over both codecs

use base64::{engine::general_purpose::STANDARD, Engine};
use idgate_connector::value::Value;

use crate::binary::{BinaryObjectReader, BinaryObjectWriter};
use crate::error::{SerializerError, SerializerResult};
use crate::xml::{XmlObjectReader, XmlObjectWriter};

/// Encode one value as a binary stream.
pub fn serialize_to_bytes(value: &Value) -> SerializerResult<Vec<u8>> {
    let mut writer = BinaryObjectWriter::new(Vec::new())?;
    writer.write_object(value)?;
    writer.into_inner()
}

/// Decode the single value of a binary stream.
///
/// Bytes left after that value are a [`SerializerError::MalformedStream`];
/// use [`BinaryObjectReader`] to read streams holding several values.
pub fn deserialize_from_bytes(bytes: &[u8]) -> SerializerResult<Value> {
    let mut reader = BinaryObjectReader::new(bytes)?;
    let value = reader.read_object()?;
    let rest = reader.into_inner();
    if !rest.is_empty() {
        return Err(SerializerError::malformed(format!(
            "{} bytes after the value",
            rest.len()
        )));
    }
    Ok(value)
}

pub fn serialize_to_base64(value: &Value) -> SerializerResult<String> {
    Ok(STANDARD.encode(serialize_to_bytes(value)?))
}

pub fn deserialize_from_base64(encoded: &str) -> SerializerResult<Value> {
    let bytes = STANDARD.decode(encoded)?;
    deserialize_from_bytes(&bytes)
}

/// Deep copy of `value` through the binary codec.
///
/// The copy shares nothing with the original. Fails if the graph holds a
/// value the codec cannot carry.
pub fn clone_object(value: &Value) -> SerializerResult<Value> {
    deserialize_from_bytes(&serialize_to_bytes(value)?)
}

/// Write `value` as an XML document.
///
/// With `multi` set, `value` must be a list; each element becomes one
/// top-level value of a multi-object document.
pub fn serialize_to_xml(value: &Value, multi: bool) -> SerializerResult<String> {
    let mut writer = XmlObjectWriter::new(Vec::new(), multi)?;
    match value {
        Value::List(items) if multi => {
            for item in items {
                writer.write_object(item)?;
            }
        }
        _ if multi => {
            return Err(SerializerError::invalid(
                "MultiObject",
                "multi-object documents are written from a list",
            ))
        }
        _ => writer.write_object(value)?,
    }
    let bytes = writer.finish()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read an XML document. A multi-object document is returned as a list.
pub fn deserialize_from_xml(xml: &str, multi: bool) -> SerializerResult<Value> {
    let mut reader = XmlObjectReader::new(xml.as_bytes(), multi);
    if !multi {
        return reader.read_object();
    }
    let mut items = Vec::new();
    while let Some(item) = reader.next_object()? {
        items.push(item);
    }
    Ok(Value::List(items))
}
