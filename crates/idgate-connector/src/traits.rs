//! Connector Framework traits
//!
//! Capability-based trait definitions for connectors. A connector implements
//! [`Connector`] plus the capability traits it supports, and advertises each
//! capability through the matching `as_*_op` accessor.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::filter::Filter;
use crate::objects::{
    Attribute, ConnectorObject, GuardedString, ObjectClass, OperationOptions, ScriptContext,
    SearchResult, SyncDelta, SyncToken, Uid,
};
use crate::schema::Schema;
use crate::value::Value;

/// Base trait for all connectors.
///
/// Capability accessors default to `None`; a connector overrides the ones it
/// implements, usually as `Some(self)`.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;

    /// Validate the connector's configuration.
    fn validate(&self) -> ConnectorResult<()> {
        Ok(())
    }

    /// Dispose of connector resources.
    ///
    /// Called by the pool that owns the instance when it is evicted.
    async fn dispose(&self) -> ConnectorResult<()> {
        Ok(())
    }

    fn as_create_op(&self) -> Option<&dyn CreateOp> {
        None
    }

    fn as_update_op(&self) -> Option<&dyn UpdateOp> {
        None
    }

    fn as_delete_op(&self) -> Option<&dyn DeleteOp> {
        None
    }

    fn as_search_op(&self) -> Option<&dyn SearchOp> {
        None
    }

    fn as_sync_op(&self) -> Option<&dyn SyncOp> {
        None
    }

    fn as_authenticate_op(&self) -> Option<&dyn AuthenticateOp> {
        None
    }

    fn as_resolve_username_op(&self) -> Option<&dyn ResolveUsernameOp> {
        None
    }

    fn as_schema_op(&self) -> Option<&dyn SchemaOp> {
        None
    }

    fn as_test_op(&self) -> Option<&dyn TestOp> {
        None
    }

    fn as_script_on_connector_op(&self) -> Option<&dyn ScriptOnConnectorOp> {
        None
    }

    fn as_script_on_resource_op(&self) -> Option<&dyn ScriptOnResourceOp> {
        None
    }
}

/// Receives search results one at a time.
pub trait ResultsHandler: Send {
    /// Handle one object; return `false` to stop the search.
    fn handle(&mut self, object: ConnectorObject) -> bool;
}

impl<F> ResultsHandler for F
where
    F: FnMut(ConnectorObject) -> bool + Send,
{
    fn handle(&mut self, object: ConnectorObject) -> bool {
        self(object)
    }
}

/// Receives sync deltas one at a time.
pub trait SyncResultsHandler: Send {
    /// Handle one delta; return `false` to stop the sync.
    fn handle(&mut self, delta: SyncDelta) -> bool;
}

impl<F> SyncResultsHandler for F
where
    F: FnMut(SyncDelta) -> bool + Send,
{
    fn handle(&mut self, delta: SyncDelta) -> bool {
        self(delta)
    }
}

/// Capability for creating objects in the target system.
#[async_trait]
pub trait CreateOp: Send + Sync {
    /// Create a new object in the target system.
    ///
    /// # Arguments
    /// * `object_class` - The type of object to create
    /// * `attributes` - The attributes of the new object, including `__NAME__`
    /// * `options` - Additional operation options
    ///
    /// # Returns
    /// The UID of the created object.
    async fn create(
        &self,
        object_class: &ObjectClass,
        attributes: Vec<Attribute>,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid>;
}

/// Capability for updating objects in the target system.
#[async_trait]
pub trait UpdateOp: Send + Sync {
    /// Replace attribute values of an existing object.
    ///
    /// # Returns
    /// The UID of the updated object (may change for some systems).
    async fn update(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        replace_attributes: Vec<Attribute>,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid>;
}

/// Capability for deleting objects from the target system.
#[async_trait]
pub trait DeleteOp: Send + Sync {
    async fn delete(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        options: &OperationOptions,
    ) -> ConnectorResult<()>;
}

/// Capability for searching objects in the target system.
#[async_trait]
pub trait SearchOp: Send + Sync {
    /// Search for objects in the target system.
    ///
    /// # Arguments
    /// * `object_class` - The type of objects to search for
    /// * `filter` - The search filter; `None` returns every object
    /// * `handler` - Receives each match; the search stops when it returns `false`
    /// * `options` - Paging and attributes-to-get options
    ///
    /// A connector may return a superset of the filter's matches; the facade
    /// can re-apply the filter locally.
    async fn execute_query(
        &self,
        object_class: &ObjectClass,
        filter: Option<&Filter>,
        handler: &mut dyn ResultsHandler,
        options: &OperationOptions,
    ) -> ConnectorResult<SearchResult>;
}

/// Capability for reading changes from the target system.
#[async_trait]
pub trait SyncOp: Send + Sync {
    /// Deliver every change after `token` to `handler`.
    ///
    /// # Returns
    /// The token of the last change delivered, if any.
    async fn sync(
        &self,
        object_class: &ObjectClass,
        token: Option<&SyncToken>,
        handler: &mut dyn SyncResultsHandler,
        options: &OperationOptions,
    ) -> ConnectorResult<Option<SyncToken>>;

    /// Get the token of the most recent change.
    async fn get_latest_sync_token(
        &self,
        object_class: &ObjectClass,
    ) -> ConnectorResult<Option<SyncToken>>;
}

/// Capability for authenticating accounts.
#[async_trait]
pub trait AuthenticateOp: Send + Sync {
    /// Authenticate an account and return its UID.
    async fn authenticate(
        &self,
        object_class: &ObjectClass,
        username: &str,
        password: &GuardedString,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid>;
}

/// Capability for resolving a username to a UID without authenticating.
#[async_trait]
pub trait ResolveUsernameOp: Send + Sync {
    async fn resolve_username(
        &self,
        object_class: &ObjectClass,
        username: &str,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid>;
}

/// Capability for describing the target system.
#[async_trait]
pub trait SchemaOp: Send + Sync {
    async fn schema(&self) -> ConnectorResult<Schema>;
}

/// Capability for checking connectivity to the target system.
#[async_trait]
pub trait TestOp: Send + Sync {
    /// Returns `Ok(())` if the target system is reachable and usable.
    async fn test(&self) -> ConnectorResult<()>;
}

/// Capability for running a script inside the connector.
#[async_trait]
pub trait ScriptOnConnectorOp: Send + Sync {
    async fn run_script_on_connector(
        &self,
        script: &ScriptContext,
        options: &OperationOptions,
    ) -> ConnectorResult<Value>;
}

/// Capability for running a script on the target system.
#[async_trait]
pub trait ScriptOnResourceOp: Send + Sync {
    async fn run_script_on_resource(
        &self,
        script: &ScriptContext,
        options: &OperationOptions,
    ) -> ConnectorResult<Value>;
}
