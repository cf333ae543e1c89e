//! Serializer error types

use idgate_connector::error::ConnectorError;
use thiserror::Error;

/// Error raised while encoding or decoding the object graph.
#[derive(Debug, Error)]
pub enum SerializerError {
    /// A value kind, tag or element with no registry entry.
    #[error("unsupported type: {type_name}")]
    UnsupportedType { type_name: String },

    /// Corrupt or truncated binary input.
    #[error("malformed stream: {0}")]
    MalformedStream(String),

    /// Input that is not well-formed XML, or XML outside the element grammar.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// Well-formed input whose content does not fit the type it is tagged as.
    #[error("invalid content for '{tag}': {message}")]
    InvalidContent { tag: String, message: String },

    /// The sink or source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl SerializerError {
    pub(crate) fn unsupported(type_name: impl Into<String>) -> Self {
        SerializerError::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    pub(crate) fn invalid(tag: impl Into<String>, message: impl Into<String>) -> Self {
        SerializerError::InvalidContent {
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        SerializerError::MalformedStream(message.into())
    }

    pub(crate) fn malformed_xml(message: impl std::fmt::Display) -> Self {
        SerializerError::MalformedXml(message.to_string())
    }

    /// Check if the input bytes themselves are corrupt, as opposed to
    /// well-formed input referencing something unknown.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            SerializerError::MalformedStream(_) | SerializerError::MalformedXml(_)
        )
    }
}

impl From<SerializerError> for ConnectorError {
    fn from(error: SerializerError) -> Self {
        ConnectorError::io(error.to_string())
    }
}

/// Result type for serializer operations.
pub type SerializerResult<T> = Result<T, SerializerError>;
