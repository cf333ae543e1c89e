//! Remote protocol messages
//!
//! The request/response frames exchanged with a remote connector server.
//! They travel through the same codecs as every other value.

use crate::error::ConnectorError;
use crate::objects::ConnectorKey;
use crate::types::ApiOperation;
use crate::value::Value;

/// A protocol frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteMessage {
    /// Opens a session; `info_level` selects what the server reports back.
    HelloRequest { info_level: i32 },
    /// Server greeting listing the connectors it hosts.
    HelloResponse {
        error: Option<ConnectorError>,
        connector_keys: Vec<ConnectorKey>,
    },
    /// Invokes an API operation on a hosted connector.
    OperationRequest {
        connector_key: ConnectorKey,
        operation: ApiOperation,
        arguments: Vec<Value>,
    },
    /// One result (or the failure) of an operation; streamed operations
    /// send one part per result.
    OperationResponsePart {
        error: Option<ConnectorError>,
        result: Box<Value>,
    },
    /// No more parts follow.
    OperationResponseEnd,
    /// The server waits for the client before streaming more parts.
    OperationResponsePause,
    /// Client asks the server to resume streaming.
    OperationRequestMoreData,
    /// Client asks the server to stop streaming.
    OperationRequestStopData,
}

impl RemoteMessage {
    /// Report only the server's own information.
    pub const SERVER_INFO: i32 = 4;
    /// Report the keys of hosted connectors.
    pub const CONNECTOR_KEY_INFO: i32 = 2;

    /// A successful response part.
    pub fn result(result: impl Into<Value>) -> Self {
        RemoteMessage::OperationResponsePart {
            error: None,
            result: Box::new(result.into()),
        }
    }

    /// A failed response part.
    pub fn failure(error: ConnectorError) -> Self {
        RemoteMessage::OperationResponsePart {
            error: Some(error),
            result: Box::new(Value::Null),
        }
    }

    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            RemoteMessage::HelloRequest { .. } => MessageKind::HelloRequest,
            RemoteMessage::HelloResponse { .. } => MessageKind::HelloResponse,
            RemoteMessage::OperationRequest { .. } => MessageKind::OperationRequest,
            RemoteMessage::OperationResponsePart { .. } => MessageKind::OperationResponsePart,
            RemoteMessage::OperationResponseEnd => MessageKind::OperationResponseEnd,
            RemoteMessage::OperationResponsePause => MessageKind::OperationResponsePause,
            RemoteMessage::OperationRequestMoreData => MessageKind::OperationRequestMoreData,
            RemoteMessage::OperationRequestStopData => MessageKind::OperationRequestStopData,
        }
    }
}

/// Variant of a [`RemoteMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    HelloRequest,
    HelloResponse,
    OperationRequest,
    OperationResponsePart,
    OperationResponseEnd,
    OperationResponsePause,
    OperationRequestMoreData,
    OperationRequestStopData,
}

impl MessageKind {
    #[must_use]
    pub fn all() -> &'static [MessageKind] {
        &[
            MessageKind::HelloRequest,
            MessageKind::HelloResponse,
            MessageKind::OperationRequest,
            MessageKind::OperationResponsePart,
            MessageKind::OperationResponseEnd,
            MessageKind::OperationResponsePause,
            MessageKind::OperationRequestMoreData,
            MessageKind::OperationRequestStopData,
        ]
    }
}
