//! Connector Framework type definitions
//!
//! Enumerations shared by the facade, its configuration and the remote
//! protocol.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An operation of the connector API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ApiOperation {
    /// Create an object
    Create,
    /// Update an object's attributes
    Update,
    /// Delete an object
    Delete,
    /// Search objects with a filter
    Search,
    /// Read one object by UID
    Get,
    /// Read changes since a sync token
    Sync,
    /// Read the latest sync token
    GetLatestSyncToken,
    /// Authenticate an account
    Authenticate,
    /// Resolve a username to a UID
    ResolveUsername,
    /// Describe the target system
    Schema,
    /// Check connectivity to the target system
    Test,
    /// Validate the connector configuration
    Validate,
    /// Run a script inside the connector
    ScriptOnConnector,
    /// Run a script on the target system
    ScriptOnResource,
}

impl ApiOperation {
    /// Get all API operations.
    #[must_use]
    pub fn all() -> &'static [ApiOperation] {
        &[
            ApiOperation::Create,
            ApiOperation::Update,
            ApiOperation::Delete,
            ApiOperation::Search,
            ApiOperation::Get,
            ApiOperation::Sync,
            ApiOperation::GetLatestSyncToken,
            ApiOperation::Authenticate,
            ApiOperation::ResolveUsername,
            ApiOperation::Schema,
            ApiOperation::Test,
            ApiOperation::Validate,
            ApiOperation::ScriptOnConnector,
            ApiOperation::ScriptOnResource,
        ]
    }

    /// Get the string representation used in configuration and on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiOperation::Create => "create",
            ApiOperation::Update => "update",
            ApiOperation::Delete => "delete",
            ApiOperation::Search => "search",
            ApiOperation::Get => "get",
            ApiOperation::Sync => "sync",
            ApiOperation::GetLatestSyncToken => "get_latest_sync_token",
            ApiOperation::Authenticate => "authenticate",
            ApiOperation::ResolveUsername => "resolve_username",
            ApiOperation::Schema => "schema",
            ApiOperation::Test => "test",
            ApiOperation::Validate => "validate",
            ApiOperation::ScriptOnConnector => "script_on_connector",
            ApiOperation::ScriptOnResource => "script_on_resource",
        }
    }

    /// Check if the operation only reads from the target system.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ApiOperation::Search
                | ApiOperation::Get
                | ApiOperation::Sync
                | ApiOperation::GetLatestSyncToken
                | ApiOperation::ResolveUsername
                | ApiOperation::Schema
                | ApiOperation::Test
                | ApiOperation::Validate
        )
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApiOperation {
    type Err = ParseApiOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ApiOperation::all()
            .iter()
            .copied()
            .find(|op| op.as_str() == lower)
            .ok_or_else(|| ParseApiOperationError(s.to_string()))
    }
}

/// Error parsing an API operation from string.
#[derive(Debug, Clone)]
pub struct ParseApiOperationError(String);

impl fmt::Display for ParseApiOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid API operation '{}'", self.0)
    }
}

impl std::error::Error for ParseApiOperationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_operation_from_str() {
        assert_eq!(
            "create".parse::<ApiOperation>().unwrap(),
            ApiOperation::Create
        );
        assert_eq!(
            "SCRIPT_ON_RESOURCE".parse::<ApiOperation>().unwrap(),
            ApiOperation::ScriptOnResource
        );
        assert!("invalid".parse::<ApiOperation>().is_err());
    }

    #[test]
    fn test_api_operation_round_trips_through_str() {
        for op in ApiOperation::all() {
            assert_eq!(op.as_str().parse::<ApiOperation>().unwrap(), *op);
        }
    }

    #[test]
    fn test_api_operation_serialization() {
        let json = serde_json::to_string(&ApiOperation::GetLatestSyncToken).unwrap();
        assert_eq!(json, "\"get_latest_sync_token\"");
        let parsed: ApiOperation = serde_json::from_str("\"resolve_username\"").unwrap();
        assert_eq!(parsed, ApiOperation::ResolveUsername);
    }

    #[test]
    fn test_api_operation_read_only() {
        assert!(ApiOperation::Search.is_read_only());
        assert!(!ApiOperation::Create.is_read_only());
        assert!(!ApiOperation::ScriptOnResource.is_read_only());
    }
}
