//! # Connector Framework
//!
//! Core abstractions for reaching external identity systems through
//! pluggable connectors.
//!
//! ## Architecture
//!
//! The framework uses a capability-based trait system:
//!
//! - [`Connector`](traits::Connector) - Base trait all connectors implement
//! - [`CreateOp`](traits::CreateOp), [`UpdateOp`](traits::UpdateOp),
//!   [`DeleteOp`](traits::DeleteOp) - CRUD operations
//! - [`SearchOp`](traits::SearchOp), [`SyncOp`](traits::SyncOp) - Streaming reads
//!
//! Callers go through [`ConnectorFacade`](facade::ConnectorFacade), which
//! checks support, applies timeouts and logs every operation.
//!
//! ## Example
//!
//! ```ignore
//! use idgate_connector::prelude::*;
//!
//! let pool = Arc::new(SingleConnectorPool::new(Arc::new(my_connector)));
//! let facade = ConnectorFacade::new(pool, FacadeConfig::default())?;
//!
//! let filter = Filter::parse(r#"name sw "b" and age ge 21"#)?;
//! let mut names = Vec::new();
//! facade
//!     .search(&ObjectClass::account(), Some(&filter), &mut |o: ConnectorObject| {
//!         names.push(o.name().unwrap_or_default().to_string());
//!         true
//!     }, &OperationOptions::new())
//!     .await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`objects`] - Connector objects, attributes, UIDs, sync and search types
//! - [`value`] - The value graph exchanged with remote connectors
//! - [`schema`] - Schema descriptors
//! - [`filter`] - Attribute-based filters, visitor and native translation
//! - [`query`] - Field-based filters and the filter grammar parser
//! - [`error`] - The framework error hierarchy
//! - [`remote`] - Remote protocol messages
//! - [`traits`] - Connector capability traits
//! - [`facade`] - Dispatch layer and its collaborators
//! - [`config`] - Facade configuration

pub mod config;
pub mod error;
pub mod facade;
pub mod filter;
pub mod ids;
pub mod objects;
pub mod query;
pub mod remote;
pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

/// Prelude module for convenient imports.
///
/// ```
/// use idgate_connector::prelude::*;
/// ```
pub mod prelude {
    // IDs and types
    pub use crate::ids::OperationId;
    pub use crate::types::ApiOperation;

    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult, ErrorKind};

    // Objects
    pub use crate::objects::{
        Attribute, AttributeType, AttributeValue, ConnectorKey, ConnectorObject,
        ConnectorObjectBuilder, GuardedString, Name, ObjectClass, OperationOptions, QualifiedUid,
        ScriptContext, SearchResult, SyncDelta, SyncDeltaType, SyncToken, Uid,
    };

    // Schema
    pub use crate::schema::{AttributeFlag, AttributeInfo, ObjectClassInfo, Schema};

    // Value graph
    pub use crate::value::{Locale, PrimitiveArray, Value, ValueKind, ValueSet};

    // Filters
    pub use crate::filter::{Filter, FilterKind, FilterTranslator, FilterVisitor};
    pub use crate::query::{
        parse_query_filter, ComparisonOperator, FilterParseError, JsonPointer, QueryFilter,
        QueryFilterVisitor,
    };

    // Remote protocol
    pub use crate::remote::{MessageKind, RemoteMessage};

    // Traits
    pub use crate::traits::{
        AuthenticateOp, Connector, CreateOp, DeleteOp, ResolveUsernameOp, ResultsHandler,
        SchemaOp, ScriptOnConnectorOp, ScriptOnResourceOp, SearchOp, SyncOp, SyncResultsHandler,
        TestOp, UpdateOp,
    };

    // Facade
    pub use crate::config::FacadeConfig;
    pub use crate::facade::{
        ConnectorFacade, ConnectorPool, ScriptExecutor, ScriptExecutorFactory,
        SingleConnectorPool,
    };
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _id = OperationId::new();
        let _op = ApiOperation::Search;
        let _uid = Uid::new("42");
        let _attr = Attribute::single("mail", "a@example.com");
        let _filter = Filter::equal_to(Attribute::single("mail", "a@example.com"));
        let _config = FacadeConfig::default();
        assert!(Filter::parse("true").is_ok());
    }
}
