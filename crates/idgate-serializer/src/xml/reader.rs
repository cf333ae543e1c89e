//! XML object reader

use std::borrow::Cow;
use std::io::BufRead;

use base64::{engine::general_purpose::STANDARD, Engine};
use idgate_connector::value::{PrimitiveArray, Value};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::trace;

use super::grammar::MULTI_OBJECT_ELEMENT;
use super::XmlObjectResultsHandler;
use crate::binary::MAX_DECODE_DEPTH;
use crate::error::{SerializerError, SerializerResult};
use crate::registry::{Body, Registry, Scalar, ScalarType, Shape};

/// Owned view of the parser events the decoder cares about.
#[derive(Debug)]
enum XmlEvent {
    Start(String),
    Empty(String),
    End(String),
    Text(String),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Prolog,
    Open,
    Done,
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

fn parse_token<T: std::str::FromStr>(tag: &str, token: &str) -> SerializerResult<T>
where
    T::Err: std::fmt::Display,
{
    token
        .parse()
        .map_err(|e| SerializerError::invalid(tag, format!("invalid value '{token}': {e}")))
}

fn parse_bool(tag: &str, token: &str) -> SerializerResult<bool> {
    match token {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(SerializerError::invalid(
            tag,
            format!("invalid boolean '{other}'"),
        )),
    }
}

fn parse_code_point(tag: &str, token: &str) -> SerializerResult<char> {
    let code: u32 = parse_token(tag, token)?;
    char::from_u32(code)
        .ok_or_else(|| SerializerError::invalid(tag, format!("invalid code point {code}")))
}

fn parse_scalar(tag: &str, scalar_type: ScalarType, text: String) -> SerializerResult<Scalar> {
    Ok(match scalar_type {
        ScalarType::Null => {
            if !is_blank(&text) {
                return Err(SerializerError::invalid(tag, "null holds no content"));
            }
            Scalar::Null
        }
        ScalarType::Boolean => Scalar::Boolean(parse_bool(tag, &text)?),
        ScalarType::Character => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Scalar::Character(c),
                _ => {
                    return Err(SerializerError::invalid(
                        tag,
                        format!("expected one character, found '{text}'"),
                    ))
                }
            }
        }
        ScalarType::Integer => Scalar::Integer(parse_token(tag, &text)?),
        ScalarType::Long => Scalar::Long(parse_token(tag, &text)?),
        ScalarType::Float => Scalar::Float(parse_token(tag, &text)?),
        ScalarType::Double => Scalar::Double(parse_token(tag, &text)?),
        ScalarType::Text => Scalar::Text(text),
        ScalarType::Bytes => Scalar::Bytes(STANDARD.decode(text.trim())?),
    })
}

fn parse_array(tag: &str, element: ScalarType, text: &str) -> SerializerResult<PrimitiveArray> {
    let tokens = text.split_whitespace();
    Ok(match element {
        ScalarType::Boolean => PrimitiveArray::Boolean(
            tokens
                .map(|t| parse_bool(tag, t))
                .collect::<SerializerResult<_>>()?,
        ),
        ScalarType::Character => PrimitiveArray::Character(
            tokens
                .map(|t| parse_code_point(tag, t))
                .collect::<SerializerResult<_>>()?,
        ),
        ScalarType::Integer => PrimitiveArray::Integer(
            tokens
                .map(|t| parse_token(tag, t))
                .collect::<SerializerResult<_>>()?,
        ),
        ScalarType::Long => PrimitiveArray::Long(
            tokens
                .map(|t| parse_token(tag, t))
                .collect::<SerializerResult<_>>()?,
        ),
        ScalarType::Float => PrimitiveArray::Float(
            tokens
                .map(|t| parse_token(tag, t))
                .collect::<SerializerResult<_>>()?,
        ),
        ScalarType::Double => PrimitiveArray::Double(
            tokens
                .map(|t| parse_token(tag, t))
                .collect::<SerializerResult<_>>()?,
        ),
        other => {
            return Err(SerializerError::invalid(
                tag,
                format!("{other:?} is not a primitive array element"),
            ))
        }
    })
}

/// Reads values from an XML document.
///
/// In multi-object mode values are decoded one at a time as the document is
/// parsed, so a consumer can stop without reading the rest of the input.
pub struct XmlObjectReader<'r, R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    registry: &'r Registry,
    multi: bool,
    state: State,
}

impl<R: BufRead> XmlObjectReader<'static, R> {
    pub fn new(reader: R, multi: bool) -> Self {
        Self::with_registry(reader, multi, Registry::standard())
    }
}

impl<'r, R: BufRead> XmlObjectReader<'r, R> {
    pub fn with_registry(reader: R, multi: bool, registry: &'r Registry) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            registry,
            multi,
            state: State::Prolog,
        }
    }

    /// Read the value of a single-object document.
    pub fn read_object(&mut self) -> SerializerResult<Value> {
        if self.multi {
            return Err(SerializerError::invalid(
                "document",
                "multi-object documents are read with next_object",
            ));
        }
        if self.state != State::Prolog {
            return Err(SerializerError::invalid("document", "document already read"));
        }
        let value = match self.next_significant()? {
            XmlEvent::Start(name) => self.read_element(name, false, 0)?,
            XmlEvent::Empty(name) => self.read_element(name, true, 0)?,
            _ => return Err(SerializerError::malformed_xml("document has no root element")),
        };
        self.expect_eof()?;
        self.state = State::Done;
        Ok(value)
    }

    /// Read the next value of a multi-object document, or `None` once the
    /// root element is closed.
    pub fn next_object(&mut self) -> SerializerResult<Option<Value>> {
        if !self.multi {
            return Err(SerializerError::invalid(
                "document",
                "single-object documents are read with read_object",
            ));
        }
        if self.state == State::Prolog {
            match self.next_significant()? {
                XmlEvent::Start(name) if name == MULTI_OBJECT_ELEMENT => self.state = State::Open,
                XmlEvent::Empty(name) if name == MULTI_OBJECT_ELEMENT => {
                    self.expect_eof()?;
                    self.state = State::Done;
                }
                XmlEvent::Start(name) | XmlEvent::Empty(name) => {
                    return Err(SerializerError::malformed_xml(format!(
                        "expected {MULTI_OBJECT_ELEMENT} root, found {name}"
                    )))
                }
                _ => return Err(SerializerError::malformed_xml("document has no root element")),
            }
        }
        if self.state == State::Done {
            return Ok(None);
        }
        match self.next_significant()? {
            XmlEvent::Start(name) => self.read_element(name, false, 1).map(Some),
            XmlEvent::Empty(name) => self.read_element(name, true, 1).map(Some),
            XmlEvent::End(_) => {
                self.expect_eof()?;
                self.state = State::Done;
                Ok(None)
            }
            _ => Err(SerializerError::malformed_xml("unexpected end of document")),
        }
    }

    /// Push every value of a multi-object document to `handler` until it
    /// asks to stop or the document ends. Returns the number of values
    /// delivered.
    pub fn read_all<H>(&mut self, handler: &mut H) -> SerializerResult<usize>
    where
        H: XmlObjectResultsHandler + ?Sized,
    {
        let mut delivered = 0;
        while let Some(value) = self.next_object()? {
            delivered += 1;
            if !handler.handle(value) {
                trace!(delivered, "XML multi-object stream stopped by handler");
                return Ok(delivered);
            }
        }
        trace!(delivered, "XML multi-object stream exhausted");
        Ok(delivered)
    }

    fn next_event(&mut self) -> SerializerResult<XmlEvent> {
        loop {
            self.buf.clear();
            let event = match self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(SerializerError::malformed_xml)?
            {
                Event::Start(e) => {
                    XmlEvent::Start(String::from_utf8_lossy(e.local_name().into_inner()).into_owned())
                }
                Event::Empty(e) => {
                    XmlEvent::Empty(String::from_utf8_lossy(e.local_name().into_inner()).into_owned())
                }
                Event::End(e) => {
                    XmlEvent::End(String::from_utf8_lossy(e.local_name().into_inner()).into_owned())
                }
                Event::Text(e) => XmlEvent::Text(
                    e.unescape()
                        .map_err(SerializerError::malformed_xml)?
                        .into_owned(),
                ),
                Event::CData(e) => XmlEvent::Text(
                    String::from_utf8(e.into_inner().into_owned())
                        .map_err(SerializerError::malformed_xml)?,
                ),
                Event::Eof => XmlEvent::Eof,
                _ => continue,
            };
            return Ok(event);
        }
    }

    /// Next event that is not blank text.
    fn next_significant(&mut self) -> SerializerResult<XmlEvent> {
        loop {
            match self.next_event()? {
                XmlEvent::Text(text) if is_blank(&text) => continue,
                XmlEvent::Text(text) => {
                    return Err(SerializerError::malformed_xml(format!(
                        "unexpected text '{text}' between elements"
                    )))
                }
                event => return Ok(event),
            }
        }
    }

    fn expect_eof(&mut self) -> SerializerResult<()> {
        match self.next_significant()? {
            XmlEvent::Eof => Ok(()),
            _ => Err(SerializerError::malformed_xml(
                "content after the document element",
            )),
        }
    }

    /// Character content of a scalar element up to its end tag.
    fn read_text(&mut self, name: &str) -> SerializerResult<String> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                XmlEvent::Text(chunk) => text.push_str(&chunk),
                XmlEvent::End(end) if end == name => return Ok(text),
                XmlEvent::Start(child) | XmlEvent::Empty(child) => {
                    return Err(SerializerError::invalid(
                        name,
                        format!("unexpected element {child} in character content"),
                    ))
                }
                XmlEvent::End(_) | XmlEvent::Eof => {
                    return Err(SerializerError::malformed_xml("unexpected end of document"))
                }
            }
        }
    }

    fn read_element(&mut self, name: String, empty: bool, depth: usize) -> SerializerResult<Value> {
        if depth > MAX_DECODE_DEPTH {
            return Err(SerializerError::malformed_xml(format!(
                "elements nested deeper than {MAX_DECODE_DEPTH} levels"
            )));
        }
        let handler = self.registry.handler_for_tag(&name)?;
        let tag = handler.tag();
        let body = match handler.shape() {
            Shape::Scalar(scalar_type) => {
                let text = if empty { String::new() } else { self.read_text(&name)? };
                Body::Scalar(parse_scalar(tag, scalar_type, text)?)
            }
            Shape::PrimitiveArray(element) => {
                let text = if empty { String::new() } else { self.read_text(&name)? };
                Body::PrimitiveArray(Cow::Owned(parse_array(tag, element, &text)?))
            }
            Shape::Composite(_) => {
                let mut args = Vec::new();
                if !empty {
                    loop {
                        match self.next_significant()? {
                            XmlEvent::Start(child) => {
                                let arg = self.read_element(child, false, depth + 1)?;
                                args.push(Cow::Owned(arg));
                            }
                            XmlEvent::Empty(child) => {
                                let arg = self.read_element(child, true, depth + 1)?;
                                args.push(Cow::Owned(arg));
                            }
                            XmlEvent::End(end) if end == name => break,
                            _ => {
                                return Err(SerializerError::malformed_xml(
                                    "unexpected end of document",
                                ))
                            }
                        }
                    }
                }
                Body::Composite(args)
            }
        };
        handler.decode(body)
    }
}
