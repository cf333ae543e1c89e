//! Connector Framework error types
//!
//! The framework exception hierarchy. Every kind carries a message and an
//! optional cause so that errors can cross a serialization boundary intact.

use std::fmt;

use thiserror::Error;

use crate::objects::{ObjectClass, Uid};

/// Error that can occur during connector operations.
///
/// Errors are plain values (`Clone + PartialEq`) because they travel through
/// the object graph like any other framework type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectorError {
    /// Base connector failure.
    #[error("{message}")]
    Connector {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// I/O failure while talking to the target system or a remote peer.
    #[error("{message}")]
    ConnectorIo {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// Failed to establish connection to target system.
    #[error("{message}")]
    ConnectionFailed {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// An established connection was lost.
    #[error("{message}")]
    ConnectionBroken {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// The operation did not complete within its configured timeout.
    #[error("{message}")]
    OperationTimeout {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// Object already exists in target system (create conflict).
    #[error("{message}")]
    AlreadyExists {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
        uid: Option<Uid>,
    },

    /// Object not found in target system (update/delete target missing).
    #[error("{message}")]
    UnknownUid {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
        uid: Option<Uid>,
        object_class: Option<ObjectClass>,
    },

    /// An attribute value was rejected by the target system or a filter.
    #[error("{message}")]
    InvalidAttributeValue {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// Invalid credentials provided.
    #[error("{message}")]
    InvalidCredential {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// The new password does not satisfy the password policy.
    #[error("{message}")]
    InvalidPassword {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// Credentials have expired.
    #[error("{message}")]
    PasswordExpired {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
        uid: Option<Uid>,
    },

    /// Insufficient permissions for the operation.
    #[error("{message}")]
    PermissionDenied {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// Security related failure inside the connector.
    #[error("{message}")]
    ConnectorSecurity {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// Connector configuration is invalid.
    #[error("{message}")]
    Configuration {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// The object revision did not match the expected revision.
    #[error("{message}")]
    PreconditionFailed {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// The operation requires a revision but none was supplied.
    #[error("{message}")]
    PreconditionRequired {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// A failure the caller may retry.
    #[error("{message}")]
    Retryable {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// The connector or the facade does not support the operation.
    #[error("{message}")]
    UnsupportedOperation {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// An argument was invalid.
    #[error("{message}")]
    IllegalArgument {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// The call is not valid in the current state.
    #[error("{message}")]
    IllegalState {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },

    /// Generic runtime failure.
    ///
    /// Errors raised outside of this taxonomy are reconstituted as this kind.
    #[error("{message}")]
    Runtime {
        message: String,
        #[source]
        cause: Option<Box<ConnectorError>>,
    },
}

/// The kind of a [`ConnectorError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Connector,
    ConnectorIo,
    ConnectionFailed,
    ConnectionBroken,
    OperationTimeout,
    AlreadyExists,
    UnknownUid,
    InvalidAttributeValue,
    InvalidCredential,
    InvalidPassword,
    PasswordExpired,
    PermissionDenied,
    ConnectorSecurity,
    Configuration,
    PreconditionFailed,
    PreconditionRequired,
    Retryable,
    UnsupportedOperation,
    IllegalArgument,
    IllegalState,
    Runtime,
}

impl ErrorKind {
    /// Get all error kinds.
    #[must_use]
    pub fn all() -> &'static [ErrorKind] {
        &[
            ErrorKind::Connector,
            ErrorKind::ConnectorIo,
            ErrorKind::ConnectionFailed,
            ErrorKind::ConnectionBroken,
            ErrorKind::OperationTimeout,
            ErrorKind::AlreadyExists,
            ErrorKind::UnknownUid,
            ErrorKind::InvalidAttributeValue,
            ErrorKind::InvalidCredential,
            ErrorKind::InvalidPassword,
            ErrorKind::PasswordExpired,
            ErrorKind::PermissionDenied,
            ErrorKind::ConnectorSecurity,
            ErrorKind::Configuration,
            ErrorKind::PreconditionFailed,
            ErrorKind::PreconditionRequired,
            ErrorKind::Retryable,
            ErrorKind::UnsupportedOperation,
            ErrorKind::IllegalArgument,
            ErrorKind::IllegalState,
            ErrorKind::Runtime,
        ]
    }

    /// Get the stable classification code of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connector => "CONNECTOR",
            ErrorKind::ConnectorIo => "CONNECTOR_IO",
            ErrorKind::ConnectionFailed => "CONNECTION_FAILED",
            ErrorKind::ConnectionBroken => "CONNECTION_BROKEN",
            ErrorKind::OperationTimeout => "OPERATION_TIMEOUT",
            ErrorKind::AlreadyExists => "OBJECT_EXISTS",
            ErrorKind::UnknownUid => "UNKNOWN_UID",
            ErrorKind::InvalidAttributeValue => "INVALID_ATTRIBUTE_VALUE",
            ErrorKind::InvalidCredential => "INVALID_CREDENTIAL",
            ErrorKind::InvalidPassword => "INVALID_PASSWORD",
            ErrorKind::PasswordExpired => "PASSWORD_EXPIRED",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::ConnectorSecurity => "CONNECTOR_SECURITY",
            ErrorKind::Configuration => "INVALID_CONFIG",
            ErrorKind::PreconditionFailed => "PRECONDITION_FAILED",
            ErrorKind::PreconditionRequired => "PRECONDITION_REQUIRED",
            ErrorKind::Retryable => "RETRYABLE",
            ErrorKind::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorKind::IllegalArgument => "ILLEGAL_ARGUMENT",
            ErrorKind::IllegalState => "ILLEGAL_STATE",
            ErrorKind::Runtime => "RUNTIME",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ConnectorError {
    /// Create an error of the given kind with a message and an optional cause.
    ///
    /// Uid-carrying kinds are created without a uid.
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        cause: Option<ConnectorError>,
    ) -> Self {
        let message = message.into();
        let cause = cause.map(Box::new);
        match kind {
            ErrorKind::Connector => ConnectorError::Connector { message, cause },
            ErrorKind::ConnectorIo => ConnectorError::ConnectorIo { message, cause },
            ErrorKind::ConnectionFailed => ConnectorError::ConnectionFailed { message, cause },
            ErrorKind::ConnectionBroken => ConnectorError::ConnectionBroken { message, cause },
            ErrorKind::OperationTimeout => ConnectorError::OperationTimeout { message, cause },
            ErrorKind::AlreadyExists => ConnectorError::AlreadyExists {
                message,
                cause,
                uid: None,
            },
            ErrorKind::UnknownUid => ConnectorError::UnknownUid {
                message,
                cause,
                uid: None,
                object_class: None,
            },
            ErrorKind::InvalidAttributeValue => {
                ConnectorError::InvalidAttributeValue { message, cause }
            }
            ErrorKind::InvalidCredential => ConnectorError::InvalidCredential { message, cause },
            ErrorKind::InvalidPassword => ConnectorError::InvalidPassword { message, cause },
            ErrorKind::PasswordExpired => ConnectorError::PasswordExpired {
                message,
                cause,
                uid: None,
            },
            ErrorKind::PermissionDenied => ConnectorError::PermissionDenied { message, cause },
            ErrorKind::ConnectorSecurity => ConnectorError::ConnectorSecurity { message, cause },
            ErrorKind::Configuration => ConnectorError::Configuration { message, cause },
            ErrorKind::PreconditionFailed => ConnectorError::PreconditionFailed { message, cause },
            ErrorKind::PreconditionRequired => {
                ConnectorError::PreconditionRequired { message, cause }
            }
            ErrorKind::Retryable => ConnectorError::Retryable { message, cause },
            ErrorKind::UnsupportedOperation => {
                ConnectorError::UnsupportedOperation { message, cause }
            }
            ErrorKind::IllegalArgument => ConnectorError::IllegalArgument { message, cause },
            ErrorKind::IllegalState => ConnectorError::IllegalState { message, cause },
            ErrorKind::Runtime => ConnectorError::Runtime { message, cause },
        }
    }

    /// Get the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::Connector { .. } => ErrorKind::Connector,
            ConnectorError::ConnectorIo { .. } => ErrorKind::ConnectorIo,
            ConnectorError::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            ConnectorError::ConnectionBroken { .. } => ErrorKind::ConnectionBroken,
            ConnectorError::OperationTimeout { .. } => ErrorKind::OperationTimeout,
            ConnectorError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ConnectorError::UnknownUid { .. } => ErrorKind::UnknownUid,
            ConnectorError::InvalidAttributeValue { .. } => ErrorKind::InvalidAttributeValue,
            ConnectorError::InvalidCredential { .. } => ErrorKind::InvalidCredential,
            ConnectorError::InvalidPassword { .. } => ErrorKind::InvalidPassword,
            ConnectorError::PasswordExpired { .. } => ErrorKind::PasswordExpired,
            ConnectorError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ConnectorError::ConnectorSecurity { .. } => ErrorKind::ConnectorSecurity,
            ConnectorError::Configuration { .. } => ErrorKind::Configuration,
            ConnectorError::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            ConnectorError::PreconditionRequired { .. } => ErrorKind::PreconditionRequired,
            ConnectorError::Retryable { .. } => ErrorKind::Retryable,
            ConnectorError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            ConnectorError::IllegalArgument { .. } => ErrorKind::IllegalArgument,
            ConnectorError::IllegalState { .. } => ErrorKind::IllegalState,
            ConnectorError::Runtime { .. } => ErrorKind::Runtime,
        }
    }

    /// Get the message of this error.
    #[must_use]
    pub fn message(&self) -> &str {
        self.parts().0
    }

    /// Get the cause of this error, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&ConnectorError> {
        self.parts().1.as_deref()
    }

    /// Get the uid carried by this error, if its kind carries one.
    #[must_use]
    pub fn uid(&self) -> Option<&Uid> {
        match self {
            ConnectorError::AlreadyExists { uid, .. }
            | ConnectorError::UnknownUid { uid, .. }
            | ConnectorError::PasswordExpired { uid, .. } => uid.as_ref(),
            _ => None,
        }
    }

    /// Get the object class carried by an `UnknownUidException`.
    #[must_use]
    pub fn object_class(&self) -> Option<&ObjectClass> {
        match self {
            ConnectorError::UnknownUid { object_class, .. } => object_class.as_ref(),
            _ => None,
        }
    }

    /// Attach an object class to an `UnknownUidException`; other kinds are
    /// returned unchanged.
    #[must_use]
    pub fn with_object_class(mut self, new_class: ObjectClass) -> Self {
        if let ConnectorError::UnknownUid { object_class, .. } = &mut self {
            *object_class = Some(new_class);
        }
        self
    }

    fn parts(&self) -> (&str, &Option<Box<ConnectorError>>) {
        match self {
            ConnectorError::Connector { message, cause }
            | ConnectorError::ConnectorIo { message, cause }
            | ConnectorError::ConnectionFailed { message, cause }
            | ConnectorError::ConnectionBroken { message, cause }
            | ConnectorError::OperationTimeout { message, cause }
            | ConnectorError::AlreadyExists { message, cause, .. }
            | ConnectorError::UnknownUid { message, cause, .. }
            | ConnectorError::InvalidAttributeValue { message, cause }
            | ConnectorError::InvalidCredential { message, cause }
            | ConnectorError::InvalidPassword { message, cause }
            | ConnectorError::PasswordExpired { message, cause, .. }
            | ConnectorError::PermissionDenied { message, cause }
            | ConnectorError::ConnectorSecurity { message, cause }
            | ConnectorError::Configuration { message, cause }
            | ConnectorError::PreconditionFailed { message, cause }
            | ConnectorError::PreconditionRequired { message, cause }
            | ConnectorError::Retryable { message, cause }
            | ConnectorError::UnsupportedOperation { message, cause }
            | ConnectorError::IllegalArgument { message, cause }
            | ConnectorError::IllegalState { message, cause }
            | ConnectorError::Runtime { message, cause } => (message, cause),
        }
    }

    /// Check if this error is transient and the operation could be retried.
    ///
    /// Transient errors are those caused by temporary conditions that may resolve
    /// themselves, such as network issues or timeouts.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. }
                | ConnectorError::ConnectionBroken { .. }
                | ConnectorError::ConnectorIo { .. }
                | ConnectorError::OperationTimeout { .. }
                | ConnectorError::Retryable { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Capture an arbitrary error as a framework error.
    ///
    /// A `ConnectorError` is returned as-is. Any other error becomes a
    /// [`ConnectorError::Runtime`] carrying its message, with its `source()`
    /// chain converted the same way.
    pub fn from_foreign(error: &(dyn std::error::Error + 'static)) -> Self {
        if let Some(known) = error.downcast_ref::<ConnectorError>() {
            return known.clone();
        }
        let cause = error.source().map(|s| Box::new(Self::from_foreign(s)));
        tracing::debug!(error = %error, "capturing unregistered error as RuntimeException");
        ConnectorError::Runtime {
            message: error.to_string(),
            cause,
        }
    }

    /// Attach a uid to kinds that carry one; other kinds are returned unchanged.
    #[must_use]
    pub fn with_uid(mut self, new_uid: Uid) -> Self {
        match &mut self {
            ConnectorError::AlreadyExists { uid, .. }
            | ConnectorError::UnknownUid { uid, .. }
            | ConnectorError::PasswordExpired { uid, .. } => *uid = Some(new_uid),
            _ => {}
        }
        self
    }

    // Convenience constructors

    /// Create a base connector error.
    pub fn connector(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connector, message, None)
    }

    /// Create a connector I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectorIo, message, None)
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionFailed, message, None)
    }

    /// Create a connection failed error with cause.
    pub fn connection_failed_with_cause(message: impl Into<String>, cause: ConnectorError) -> Self {
        Self::new(ErrorKind::ConnectionFailed, message, Some(cause))
    }

    /// Create an operation timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperationTimeout, message, None)
    }

    /// Create an already-exists error for the given uid.
    pub fn already_exists(message: impl Into<String>, uid: Uid) -> Self {
        Self::new(ErrorKind::AlreadyExists, message, None).with_uid(uid)
    }

    /// Create an unknown-uid error.
    pub fn unknown_uid(uid: Uid, object_class: ObjectClass) -> Self {
        ConnectorError::UnknownUid {
            message: format!("object {uid} of class {object_class} does not exist"),
            cause: None,
            uid: Some(uid),
            object_class: Some(object_class),
        }
    }

    /// Create an invalid attribute value error.
    pub fn invalid_attribute_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidAttributeValue, message, None)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message, None)
    }

    /// Create an unsupported operation error.
    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedOperation, message, None)
    }

    /// Create an illegal argument error.
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalArgument, message, None)
    }

    /// Create an illegal state error.
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalState, message, None)
    }

    /// Create a generic runtime error.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message, None)
    }

    /// Create a generic runtime error with cause.
    pub fn runtime_with_cause(message: impl Into<String>, cause: ConnectorError) -> Self {
        Self::new(ErrorKind::Runtime, message, Some(cause))
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
