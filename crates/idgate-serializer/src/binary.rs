//! Binary codec
//!
//! A stream starts with the `IDGB` magic and a version byte, followed by any
//! number of encoded values. Each value is its big-endian `u16` type id and
//! then its body:
//!
//! - scalars: fixed-width big-endian payloads; text and bytes are a `u32`
//!   length and the data
//! - primitive arrays: a `u32` element count and the untagged elements
//! - composites: a `u32` argument count and the arguments, each a tagged value

use std::borrow::Cow;
use std::io::{self, Read, Write};

use idgate_connector::value::{PrimitiveArray, Value};
use tracing::trace;

use crate::error::{SerializerError, SerializerResult};
use crate::registry::{Body, Registry, Scalar, ScalarType, Shape};

/// Stream magic.
pub const MAGIC: &[u8; 4] = b"IDGB";

/// Stream format version.
pub const VERSION: u8 = 1;

/// Maximum nesting of composite values accepted by either codec.
pub const MAX_DECODE_DEPTH: usize = 512;

/// Upper bound on speculative allocation for length-prefixed content.
const MAX_PREALLOCATE: usize = 4096;

fn map_eof(error: io::Error) -> SerializerError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        SerializerError::malformed("unexpected end of stream")
    } else {
        SerializerError::Io(error)
    }
}

fn too_deep() -> SerializerError {
    SerializerError::malformed(format!(
        "values nested deeper than {MAX_DECODE_DEPTH} levels"
    ))
}

/// Writes values to a byte sink.
pub struct BinaryObjectWriter<'r, W: Write> {
    writer: W,
    registry: &'r Registry,
}

impl<W: Write> BinaryObjectWriter<'static, W> {
    /// Open a stream on `writer` using the standard registry.
    pub fn new(writer: W) -> SerializerResult<Self> {
        Self::with_registry(writer, Registry::standard())
    }
}

impl<'r, W: Write> BinaryObjectWriter<'r, W> {
    /// Open a stream on `writer` using a custom registry.
    pub fn with_registry(mut writer: W, registry: &'r Registry) -> SerializerResult<Self> {
        writer.write_all(MAGIC)?;
        writer.write_all(&[VERSION])?;
        trace!("Binary stream opened");
        Ok(Self { writer, registry })
    }

    /// Append one value to the stream.
    pub fn write_object(&mut self, value: &Value) -> SerializerResult<()> {
        self.write_value(value, 0)
    }

    pub fn flush(&mut self) -> SerializerResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(mut self) -> SerializerResult<W> {
        self.flush()?;
        Ok(self.writer)
    }

    fn write_value(&mut self, value: &Value, depth: usize) -> SerializerResult<()> {
        if depth > MAX_DECODE_DEPTH {
            return Err(too_deep());
        }
        let handler = self.registry.handler_for(value.kind())?;
        let body = handler.encode(value)?;
        self.writer.write_all(&handler.id().to_be_bytes())?;
        match body {
            Body::Scalar(scalar) => self.write_scalar(&scalar),
            Body::PrimitiveArray(array) => self.write_array(&array),
            Body::Composite(args) => {
                self.write_len(args.len())?;
                args.iter()
                    .try_for_each(|arg| self.write_value(arg, depth + 1))
            }
        }
    }

    fn write_len(&mut self, len: usize) -> SerializerResult<()> {
        let len = u32::try_from(len)
            .map_err(|_| SerializerError::invalid("length", format!("{len} exceeds u32")))?;
        self.writer.write_all(&len.to_be_bytes())?;
        Ok(())
    }

    fn write_scalar(&mut self, scalar: &Scalar) -> SerializerResult<()> {
        match scalar {
            Scalar::Null => {}
            Scalar::Boolean(b) => self.writer.write_all(&[u8::from(*b)])?,
            Scalar::Character(c) => self.writer.write_all(&u32::from(*c).to_be_bytes())?,
            Scalar::Integer(i) => self.writer.write_all(&i.to_be_bytes())?,
            Scalar::Long(l) => self.writer.write_all(&l.to_be_bytes())?,
            Scalar::Float(f) => self.writer.write_all(&f.to_bits().to_be_bytes())?,
            Scalar::Double(d) => self.writer.write_all(&d.to_bits().to_be_bytes())?,
            Scalar::Text(s) => {
                self.write_len(s.len())?;
                self.writer.write_all(s.as_bytes())?;
            }
            Scalar::Bytes(b) => {
                self.write_len(b.len())?;
                self.writer.write_all(b)?;
            }
        }
        Ok(())
    }

    fn write_array(&mut self, array: &PrimitiveArray) -> SerializerResult<()> {
        self.write_len(array.len())?;
        let w = &mut self.writer;
        match array {
            PrimitiveArray::Boolean(items) => {
                for b in items {
                    w.write_all(&[u8::from(*b)])?;
                }
            }
            PrimitiveArray::Character(items) => {
                for c in items {
                    w.write_all(&u32::from(*c).to_be_bytes())?;
                }
            }
            PrimitiveArray::Integer(items) => {
                for i in items {
                    w.write_all(&i.to_be_bytes())?;
                }
            }
            PrimitiveArray::Long(items) => {
                for l in items {
                    w.write_all(&l.to_be_bytes())?;
                }
            }
            PrimitiveArray::Float(items) => {
                for f in items {
                    w.write_all(&f.to_bits().to_be_bytes())?;
                }
            }
            PrimitiveArray::Double(items) => {
                for d in items {
                    w.write_all(&d.to_bits().to_be_bytes())?;
                }
            }
        }
        Ok(())
    }
}

/// Reads values from a byte source.
pub struct BinaryObjectReader<'r, R: Read> {
    reader: R,
    registry: &'r Registry,
}

impl<R: Read> BinaryObjectReader<'static, R> {
    /// Open a stream on `reader` using the standard registry.
    pub fn new(reader: R) -> SerializerResult<Self> {
        Self::with_registry(reader, Registry::standard())
    }
}

impl<'r, R: Read> BinaryObjectReader<'r, R> {
    /// Open a stream on `reader`, checking the header.
    pub fn with_registry(mut reader: R, registry: &'r Registry) -> SerializerResult<Self> {
        let mut header = [0u8; 5];
        reader.read_exact(&mut header).map_err(map_eof)?;
        if &header[..4] != MAGIC {
            return Err(SerializerError::malformed("not a binary object stream"));
        }
        if header[4] != VERSION {
            return Err(SerializerError::malformed(format!(
                "unsupported stream version {}",
                header[4]
            )));
        }
        trace!("Binary stream opened for reading");
        Ok(Self { reader, registry })
    }

    /// Read the next value, or `None` at a clean end of stream.
    pub fn next_object(&mut self) -> SerializerResult<Option<Value>> {
        let mut first = [0u8; 1];
        loop {
            match self.reader.read(&mut first) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let mut second = [0u8; 1];
        self.reader.read_exact(&mut second).map_err(map_eof)?;
        let id = u16::from_be_bytes([first[0], second[0]]);
        self.read_body(id, 0).map(Some)
    }

    /// Read exactly one value; end of stream is an error.
    pub fn read_object(&mut self) -> SerializerResult<Value> {
        self.next_object()?
            .ok_or_else(|| SerializerError::malformed("unexpected end of stream"))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_value(&mut self, depth: usize) -> SerializerResult<Value> {
        let id = u16::from_be_bytes(self.read_array()?);
        self.read_body(id, depth)
    }

    fn read_body(&mut self, id: u16, depth: usize) -> SerializerResult<Value> {
        if depth > MAX_DECODE_DEPTH {
            return Err(too_deep());
        }
        let handler = self.registry.handler_for_id(id)?;
        let body = match handler.shape() {
            Shape::Scalar(scalar_type) => Body::Scalar(self.read_scalar(scalar_type)?),
            Shape::PrimitiveArray(element) => {
                Body::PrimitiveArray(Cow::Owned(self.read_primitives(element)?))
            }
            Shape::Composite(_) => {
                let count = self.read_len()?;
                let mut args = Vec::with_capacity(count.min(MAX_PREALLOCATE));
                for _ in 0..count {
                    args.push(Cow::Owned(self.read_value(depth + 1)?));
                }
                Body::Composite(args)
            }
        };
        handler.decode(body)
    }

    fn read_array<const N: usize>(&mut self) -> SerializerResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.reader.read_exact(&mut buf).map_err(map_eof)?;
        Ok(buf)
    }

    fn read_len(&mut self) -> SerializerResult<usize> {
        let len = u32::from_be_bytes(self.read_array()?);
        usize::try_from(len).map_err(|_| SerializerError::malformed("length exceeds address space"))
    }

    fn read_bytes(&mut self) -> SerializerResult<Vec<u8>> {
        let len = self.read_len()?;
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOCATE));
        (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(SerializerError::malformed("unexpected end of stream"));
        }
        Ok(buf)
    }

    fn read_bool(&mut self) -> SerializerResult<bool> {
        match self.read_array::<1>()? {
            [0] => Ok(false),
            [1] => Ok(true),
            [other] => Err(SerializerError::malformed(format!(
                "invalid boolean byte {other:#04x}"
            ))),
        }
    }

    fn read_char(&mut self) -> SerializerResult<char> {
        let code = u32::from_be_bytes(self.read_array()?);
        char::from_u32(code)
            .ok_or_else(|| SerializerError::malformed(format!("invalid code point {code:#x}")))
    }

    fn read_scalar(&mut self, scalar_type: ScalarType) -> SerializerResult<Scalar> {
        Ok(match scalar_type {
            ScalarType::Null => Scalar::Null,
            ScalarType::Boolean => Scalar::Boolean(self.read_bool()?),
            ScalarType::Character => Scalar::Character(self.read_char()?),
            ScalarType::Integer => Scalar::Integer(i32::from_be_bytes(self.read_array()?)),
            ScalarType::Long => Scalar::Long(i64::from_be_bytes(self.read_array()?)),
            ScalarType::Float => Scalar::Float(f32::from_bits(u32::from_be_bytes(
                self.read_array()?,
            ))),
            ScalarType::Double => Scalar::Double(f64::from_bits(u64::from_be_bytes(
                self.read_array()?,
            ))),
            ScalarType::Text => {
                let bytes = self.read_bytes()?;
                Scalar::Text(String::from_utf8(bytes).map_err(|_| {
                    SerializerError::malformed("text is not valid UTF-8")
                })?)
            }
            ScalarType::Bytes => Scalar::Bytes(self.read_bytes()?),
        })
    }

    fn read_primitives(&mut self, element: ScalarType) -> SerializerResult<PrimitiveArray> {
        let count = self.read_len()?;
        let capacity = count.min(MAX_PREALLOCATE);
        Ok(match element {
            ScalarType::Boolean => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(self.read_bool()?);
                }
                PrimitiveArray::Boolean(items)
            }
            ScalarType::Character => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(self.read_char()?);
                }
                PrimitiveArray::Character(items)
            }
            ScalarType::Integer => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(i32::from_be_bytes(self.read_array()?));
                }
                PrimitiveArray::Integer(items)
            }
            ScalarType::Long => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(i64::from_be_bytes(self.read_array()?));
                }
                PrimitiveArray::Long(items)
            }
            ScalarType::Float => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(f32::from_bits(u32::from_be_bytes(self.read_array()?)));
                }
                PrimitiveArray::Float(items)
            }
            ScalarType::Double => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(f64::from_bits(u64::from_be_bytes(self.read_array()?)));
                }
                PrimitiveArray::Double(items)
            }
            other => {
                return Err(SerializerError::invalid(
                    "array",
                    format!("{other:?} is not a primitive array element"),
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idgate_connector::objects::Uid;

    fn encode(values: &[Value]) -> Vec<u8> {
        let mut writer = BinaryObjectWriter::new(Vec::new()).unwrap();
        for value in values {
            writer.write_object(value).unwrap();
        }
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_header_written() {
        let bytes = encode(&[]);
        assert_eq!(bytes, b"IDGB\x01");
    }

    #[test]
    fn test_multiple_objects_then_clean_end() {
        let bytes = encode(&[Value::Integer(1), Value::Null, Value::from("x")]);
        let mut reader = BinaryObjectReader::new(bytes.as_slice()).unwrap();
        assert_eq!(reader.next_object().unwrap(), Some(Value::Integer(1)));
        assert_eq!(reader.next_object().unwrap(), Some(Value::Null));
        assert_eq!(reader.next_object().unwrap(), Some(Value::from("x")));
        assert_eq!(reader.next_object().unwrap(), None);
    }

    #[test]
    fn test_integer_layout_is_big_endian() {
        let bytes = encode(&[Value::Integer(-2)]);
        assert_eq!(&bytes[5..], &[0x00, 0x04, 0xFF, 0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let err = BinaryObjectReader::new(&b"XXXX\x01"[..]).err().unwrap();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_truncated_composite_is_malformed() {
        let bytes = encode(&[Value::Uid(Uid::new("abc").with_revision("1"))]);
        for cut in 6..bytes.len() {
            let mut reader = BinaryObjectReader::new(&bytes[..cut]).unwrap();
            let err = reader.next_object().unwrap_err();
            assert!(err.is_malformed(), "cut at {cut}: {err:?}");
        }
    }

    #[test]
    fn test_unknown_id_is_unsupported() {
        let mut bytes = encode(&[]);
        bytes.extend_from_slice(&[0x7F, 0xFF]);
        let mut reader = BinaryObjectReader::new(bytes.as_slice()).unwrap();
        assert!(matches!(
            reader.next_object(),
            Err(SerializerError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_invalid_boolean_byte() {
        let mut bytes = encode(&[]);
        bytes.extend_from_slice(&[0x00, 0x02, 0x07]);
        let mut reader = BinaryObjectReader::new(bytes.as_slice()).unwrap();
        assert!(reader.next_object().unwrap_err().is_malformed());
    }

    #[test]
    fn test_depth_limit() {
        let mut value = Value::Null;
        for _ in 0..=MAX_DECODE_DEPTH + 1 {
            value = Value::List(vec![value]);
        }
        let mut writer = BinaryObjectWriter::new(Vec::new()).unwrap();
        assert!(writer.write_object(&value).unwrap_err().is_malformed());

        let mut bytes = encode(&[]);
        for _ in 0..=MAX_DECODE_DEPTH + 1 {
            bytes.extend_from_slice(&[0x00, 0x21, 0x00, 0x00, 0x00, 0x01]);
        }
        bytes.extend_from_slice(&[0x00, 0x01]);
        let mut reader = BinaryObjectReader::new(bytes.as_slice()).unwrap();
        assert!(reader.next_object().unwrap_err().is_malformed());
    }
}
