//! JSON pointer field references (RFC 6901).

use std::fmt;
use std::str::FromStr;

use crate::error::ConnectorError;

/// A JSON pointer naming a (possibly nested) field of a candidate object.
///
/// The textual form is `/a/b`, with `~` escaped as `~0` and `/` as `~1`.
/// A string without a leading `/` is accepted as a single-segment pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// Create a pointer from unescaped reference tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a pointer to a top-level field.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            tokens: vec![name.into()],
        }
    }

    /// The unescaped reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The last reference token, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Check whether this pointer refers to a top-level field.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.tokens.len() == 1
    }

    /// Check whether this is the empty (whole document) pointer.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn unescape(token: &str) -> Result<String, ConnectorError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => {
                    return Err(ConnectorError::illegal_argument(format!(
                        "invalid escape in JSON pointer token '{token}'"
                    )))
                }
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

impl FromStr for JsonPointer {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        match s.strip_prefix('/') {
            Some(rest) => Ok(Self {
                tokens: rest.split('/').map(unescape).collect::<Result<_, _>>()?,
            }),
            None => Ok(Self::field(unescape(s)?)),
        }
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_pointer() {
        let pointer: JsonPointer = "/name/givenName".parse().unwrap();
        assert_eq!(pointer.tokens(), ["name", "givenName"]);
        assert_eq!(pointer.leaf(), Some("givenName"));
        assert!(!pointer.is_simple());
    }

    #[test]
    fn test_bare_field_is_single_segment() {
        let pointer: JsonPointer = "email".parse().unwrap();
        assert_eq!(pointer, JsonPointer::field("email"));
        assert_eq!(pointer.to_string(), "/email");
    }

    #[test]
    fn test_escaping() {
        let pointer = JsonPointer::new(["a/b", "m~n"]);
        assert_eq!(pointer.to_string(), "/a~1b/m~0n");
        assert_eq!(pointer.to_string().parse::<JsonPointer>().unwrap(), pointer);
    }

    #[test]
    fn test_invalid_escape() {
        assert!("/a~2".parse::<JsonPointer>().is_err());
        assert!("/a~".parse::<JsonPointer>().is_err());
    }

    #[test]
    fn test_root_pointer() {
        let pointer: JsonPointer = "".parse().unwrap();
        assert!(pointer.is_root());
        assert_eq!(pointer.to_string(), "");
    }
}
