//! XML object writer

use std::io::Write;

use base64::{engine::general_purpose::STANDARD, Engine};
use idgate_connector::value::{PrimitiveArray, Value};
use tracing::trace;

use super::grammar::{MULTI_OBJECT_ELEMENT, XML_PUBLIC_ID, XML_SYSTEM_ID};
use crate::binary::MAX_DECODE_DEPTH;
use crate::error::{SerializerError, SerializerResult};
use crate::registry::{Body, Registry, Scalar};

/// Characters allowed in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Escape character data. Carriage returns are written as references so
/// parsers do not normalize them away.
fn xml_escape(tag: &str, s: &str) -> SerializerResult<String> {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            '\r' => result.push_str("&#13;"),
            _ if is_xml_char(c) => result.push(c),
            _ => {
                return Err(SerializerError::invalid(
                    tag,
                    format!("character U+{:04X} cannot be written to XML", u32::from(c)),
                ))
            }
        }
    }
    Ok(result)
}

fn join<T>(items: &[T], f: impl Fn(&T) -> String) -> String {
    items.iter().map(f).collect::<Vec<_>>().join(" ")
}

fn scalar_text(tag: &str, scalar: &Scalar) -> SerializerResult<String> {
    Ok(match scalar {
        Scalar::Null => String::new(),
        Scalar::Boolean(b) => b.to_string(),
        Scalar::Character(c) => xml_escape(tag, c.encode_utf8(&mut [0u8; 4]))?,
        Scalar::Integer(i) => i.to_string(),
        Scalar::Long(l) => l.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Double(d) => d.to_string(),
        Scalar::Text(s) => xml_escape(tag, s)?,
        Scalar::Bytes(b) => STANDARD.encode(b),
    })
}

fn array_text(array: &PrimitiveArray) -> String {
    match array {
        PrimitiveArray::Boolean(items) => join(items, bool::to_string),
        PrimitiveArray::Character(items) => join(items, |c| u32::from(*c).to_string()),
        PrimitiveArray::Integer(items) => join(items, i32::to_string),
        PrimitiveArray::Long(items) => join(items, i64::to_string),
        PrimitiveArray::Float(items) => join(items, f32::to_string),
        PrimitiveArray::Double(items) => join(items, f64::to_string),
    }
}

/// Writes values as XML elements.
///
/// A single-object document holds exactly one value. A multi-object document
/// wraps any number of values in a `MultiObject` root and is streamed: each
/// value is written to the sink as soon as it is added.
pub struct XmlObjectWriter<'r, W: Write> {
    writer: W,
    registry: &'r Registry,
    multi: bool,
    written: usize,
}

impl<W: Write> XmlObjectWriter<'static, W> {
    pub fn new(writer: W, multi: bool) -> SerializerResult<Self> {
        Self::with_registry(writer, multi, Registry::standard())
    }
}

impl<'r, W: Write> XmlObjectWriter<'r, W> {
    pub fn with_registry(
        mut writer: W,
        multi: bool,
        registry: &'r Registry,
    ) -> SerializerResult<Self> {
        writer.write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
        if multi {
            writeln!(
                writer,
                "<!DOCTYPE {MULTI_OBJECT_ELEMENT} PUBLIC \"{XML_PUBLIC_ID}\" \"{XML_SYSTEM_ID}\">"
            )?;
            writeln!(writer, "<{MULTI_OBJECT_ELEMENT}>")?;
            trace!("XML multi-object stream opened");
        }
        Ok(Self {
            writer,
            registry,
            multi,
            written: 0,
        })
    }

    /// Write one value.
    pub fn write_object(&mut self, value: &Value) -> SerializerResult<()> {
        if !self.multi && self.written > 0 {
            return Err(SerializerError::invalid(
                "document",
                "a single-object document holds one value",
            ));
        }
        let mut out = String::new();
        self.write_value(&mut out, value, 0)?;
        out.push('\n');
        self.writer.write_all(out.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    /// Close the document and return the sink.
    pub fn finish(mut self) -> SerializerResult<W> {
        if self.multi {
            writeln!(self.writer, "</{MULTI_OBJECT_ELEMENT}>")?;
            trace!(objects = self.written, "XML multi-object stream closed");
        } else if self.written == 0 {
            return Err(SerializerError::invalid(
                "document",
                "a single-object document needs a value",
            ));
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_value(&self, out: &mut String, value: &Value, depth: usize) -> SerializerResult<()> {
        if depth > MAX_DECODE_DEPTH {
            return Err(SerializerError::invalid(
                "document",
                format!("values nested deeper than {MAX_DECODE_DEPTH} levels"),
            ));
        }
        let handler = self.registry.handler_for(value.kind())?;
        let tag = handler.tag();
        let text = match handler.encode(value)? {
            Body::Scalar(Scalar::Null) => {
                out.push_str(&format!("<{tag}/>"));
                return Ok(());
            }
            Body::Scalar(scalar) => scalar_text(tag, &scalar)?,
            Body::PrimitiveArray(array) => array_text(&array),
            Body::Composite(args) if args.is_empty() => {
                out.push_str(&format!("<{tag}/>"));
                return Ok(());
            }
            Body::Composite(args) => {
                out.push_str(&format!("<{tag}>"));
                for arg in &args {
                    self.write_value(out, arg, depth + 1)?;
                }
                out.push_str(&format!("</{tag}>"));
                return Ok(());
            }
        };
        out.push_str(&format!("<{tag}>{text}</{tag}>"));
        Ok(())
    }
}
