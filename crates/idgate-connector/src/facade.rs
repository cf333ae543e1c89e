//! Facade dispatch layer
//!
//! [`ConnectorFacade`] is what callers hold. It routes each API call to a
//! pooled connector instance after checking that the operation is supported
//! and enabled, and wraps the call in the timeout and logging proxies.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::config::FacadeConfig;
use crate::error::{ConnectorError, ConnectorResult};
use crate::filter::Filter;
use crate::ids::OperationId;
use crate::objects::{
    Attribute, ConnectorObject, GuardedString, ObjectClass, OperationOptions, ScriptContext,
    SearchResult, SyncToken, Uid,
};
use crate::schema::Schema;
use crate::traits::{Connector, ResultsHandler, SyncResultsHandler};
use crate::types::ApiOperation;
use crate::value::Value;

type OperationFuture<'a, T> = Pin<Box<dyn Future<Output = ConnectorResult<T>> + Send + 'a>>;

/// Source of connector instances.
///
/// Instance lifecycle (creation, eviction, sizing) belongs to the pool.
#[async_trait]
pub trait ConnectorPool: Send + Sync {
    /// Borrow an instance. May fail, e.g. when the target is unreachable.
    async fn acquire(&self) -> ConnectorResult<Arc<dyn Connector>>;

    /// Return an instance obtained from [`acquire`](ConnectorPool::acquire).
    async fn release(&self, connector: Arc<dyn Connector>);
}

/// A pool that hands out one shared instance.
pub struct SingleConnectorPool {
    connector: Arc<dyn Connector>,
}

impl SingleConnectorPool {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ConnectorPool for SingleConnectorPool {
    async fn acquire(&self) -> ConnectorResult<Arc<dyn Connector>> {
        Ok(Arc::clone(&self.connector))
    }

    async fn release(&self, _connector: Arc<dyn Connector>) {}
}

/// Runs scripts of one language.
pub trait ScriptExecutorFactory: Send + Sync {
    /// Script language handled by this factory, compared case-insensitively.
    fn language(&self) -> &str;

    /// Compile `script` into an executor.
    fn new_executor(&self, script: &str) -> ConnectorResult<Box<dyn ScriptExecutor>>;
}

/// A compiled script.
pub trait ScriptExecutor: Send + Sync {
    /// Run the script with named arguments.
    fn execute(&self, arguments: &BTreeMap<String, Value>) -> ConnectorResult<Value>;
}

/// Caller-facing entry point to one connector.
pub struct ConnectorFacade {
    pool: Arc<dyn ConnectorPool>,
    config: FacadeConfig,
    script_executors: BTreeMap<String, Arc<dyn ScriptExecutorFactory>>,
}

impl ConnectorFacade {
    /// Create a facade over `pool` after validating `config`.
    pub fn new(pool: Arc<dyn ConnectorPool>, config: FacadeConfig) -> ConnectorResult<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            config,
            script_executors: BTreeMap::new(),
        })
    }

    /// Register an executor used for scripts on connectors that do not run
    /// scripts themselves.
    pub fn with_script_executor(mut self, factory: Arc<dyn ScriptExecutorFactory>) -> Self {
        self.script_executors
            .insert(factory.language().to_lowercase(), factory);
        self
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }

    /// Operations the connector implements and the configuration allows.
    pub async fn supported_operations(&self) -> ConnectorResult<BTreeSet<ApiOperation>> {
        let connector = self.pool.acquire().await?;
        let supported = ApiOperation::all()
            .iter()
            .copied()
            .filter(|op| !self.config.is_disabled(*op) && self.supports(connector.as_ref(), *op))
            .collect();
        self.pool.release(connector).await;
        Ok(supported)
    }

    fn supports(&self, connector: &dyn Connector, operation: ApiOperation) -> bool {
        match operation {
            ApiOperation::Create => connector.as_create_op().is_some(),
            ApiOperation::Update => connector.as_update_op().is_some(),
            ApiOperation::Delete => connector.as_delete_op().is_some(),
            ApiOperation::Search | ApiOperation::Get => connector.as_search_op().is_some(),
            ApiOperation::Sync | ApiOperation::GetLatestSyncToken => {
                connector.as_sync_op().is_some()
            }
            ApiOperation::Authenticate => connector.as_authenticate_op().is_some(),
            ApiOperation::ResolveUsername => connector.as_resolve_username_op().is_some(),
            ApiOperation::Schema => connector.as_schema_op().is_some(),
            ApiOperation::Test => connector.as_test_op().is_some(),
            ApiOperation::Validate => true,
            ApiOperation::ScriptOnConnector => {
                connector.as_script_on_connector_op().is_some()
                    || !self.script_executors.is_empty()
            }
            ApiOperation::ScriptOnResource => connector.as_script_on_resource_op().is_some(),
        }
    }

    /// Run `call` on a pooled connector with the timeout and logging proxies.
    async fn dispatch<'a, T, F>(&'a self, operation: ApiOperation, call: F) -> ConnectorResult<T>
    where
        T: Send + 'a,
        F: FnOnce(Arc<dyn Connector>) -> OperationFuture<'a, T>,
    {
        let operation_id = OperationId::new();

        if self.config.is_disabled(operation) {
            return Err(ConnectorError::unsupported_operation(format!(
                "operation '{operation}' is disabled"
            )));
        }

        let connector = self.pool.acquire().await?;
        if !self.supports(connector.as_ref(), operation) {
            let name = connector.display_name().to_string();
            self.pool.release(connector).await;
            return Err(ConnectorError::unsupported_operation(format!(
                "connector '{name}' does not support '{operation}'"
            )));
        }

        let log = self.config.log_operations;
        if log {
            debug!(
                operation = %operation,
                operation_id = %operation_id,
                connector = %connector.display_name(),
                "Operation started"
            );
        }

        let started = Instant::now();
        let future = call(Arc::clone(&connector));
        let result = match self.config.timeout_for(operation) {
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(result) => result,
                Err(_) => Err(ConnectorError::timeout(format!(
                    "operation '{operation}' timed out after {} ms",
                    limit.as_millis()
                ))),
            },
            None => future.await,
        };
        self.pool.release(connector).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) if log => debug!(
                operation = %operation,
                operation_id = %operation_id,
                elapsed_ms = elapsed_ms,
                "Operation completed"
            ),
            Err(error) if log => warn!(
                operation = %operation,
                operation_id = %operation_id,
                elapsed_ms = elapsed_ms,
                error_code = error.error_code(),
                error = %error,
                "Operation failed"
            ),
            _ => {}
        }
        result
    }

    #[instrument(skip_all, fields(object_class = %object_class))]
    pub async fn create(
        &self,
        object_class: &ObjectClass,
        attributes: Vec<Attribute>,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid> {
        self.dispatch(ApiOperation::Create, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_create_op()
                    .ok_or_else(|| missing(ApiOperation::Create))?;
                op.create(object_class, attributes, options).await
            })
        })
        .await
    }

    #[instrument(skip_all, fields(object_class = %object_class, uid = %uid))]
    pub async fn update(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        replace_attributes: Vec<Attribute>,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid> {
        self.dispatch(ApiOperation::Update, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_update_op()
                    .ok_or_else(|| missing(ApiOperation::Update))?;
                op.update(object_class, uid, replace_attributes, options)
                    .await
            })
        })
        .await
    }

    pub async fn delete(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        options: &OperationOptions,
    ) -> ConnectorResult<()> {
        self.dispatch(ApiOperation::Delete, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_delete_op()
                    .ok_or_else(|| missing(ApiOperation::Delete))?;
                op.delete(object_class, uid, options).await
            })
        })
        .await
    }

    /// Search for objects matching `filter`.
    ///
    /// With `filter_results_locally` the filter is re-applied to every object
    /// the connector returns. Objects are reduced to the `attributesToGet`
    /// option when it is set.
    #[instrument(skip_all, fields(object_class = %object_class))]
    pub async fn search(
        &self,
        object_class: &ObjectClass,
        filter: Option<&Filter>,
        handler: &mut dyn ResultsHandler,
        options: &OperationOptions,
    ) -> ConnectorResult<SearchResult> {
        let local_filter = filter.filter(|_| self.config.filter_results_locally);
        self.dispatch(ApiOperation::Search, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_search_op()
                    .ok_or_else(|| missing(ApiOperation::Search))?;
                let mut local = LocalResultsHandler::new(handler, local_filter, options);
                let result = op
                    .execute_query(object_class, filter, &mut local, options)
                    .await?;
                local.finish()?;
                Ok(result)
            })
        })
        .await
    }

    /// Read one object by UID.
    pub async fn get(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        options: &OperationOptions,
    ) -> ConnectorResult<Option<ConnectorObject>> {
        let filter = Filter::equal_to(uid.to_attribute());
        let local_filter = self.config.filter_results_locally;
        self.dispatch(ApiOperation::Get, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_search_op()
                    .ok_or_else(|| missing(ApiOperation::Get))?;
                let mut found = None;
                let mut first = |object: ConnectorObject| {
                    found = Some(object);
                    false
                };
                let mut local =
                    LocalResultsHandler::new(&mut first, local_filter.then_some(&filter), options);
                op.execute_query(object_class, Some(&filter), &mut local, options)
                    .await?;
                local.finish()?;
                Ok(found)
            })
        })
        .await
    }

    pub async fn sync(
        &self,
        object_class: &ObjectClass,
        token: Option<&SyncToken>,
        handler: &mut dyn SyncResultsHandler,
        options: &OperationOptions,
    ) -> ConnectorResult<Option<SyncToken>> {
        self.dispatch(ApiOperation::Sync, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_sync_op()
                    .ok_or_else(|| missing(ApiOperation::Sync))?;
                op.sync(object_class, token, handler, options).await
            })
        })
        .await
    }

    pub async fn get_latest_sync_token(
        &self,
        object_class: &ObjectClass,
    ) -> ConnectorResult<Option<SyncToken>> {
        self.dispatch(ApiOperation::GetLatestSyncToken, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_sync_op()
                    .ok_or_else(|| missing(ApiOperation::GetLatestSyncToken))?;
                op.get_latest_sync_token(object_class).await
            })
        })
        .await
    }

    #[instrument(skip_all, fields(object_class = %object_class))]
    pub async fn authenticate(
        &self,
        object_class: &ObjectClass,
        username: &str,
        password: &GuardedString,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid> {
        self.dispatch(ApiOperation::Authenticate, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_authenticate_op()
                    .ok_or_else(|| missing(ApiOperation::Authenticate))?;
                op.authenticate(object_class, username, password, options)
                    .await
            })
        })
        .await
    }

    pub async fn resolve_username(
        &self,
        object_class: &ObjectClass,
        username: &str,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid> {
        self.dispatch(ApiOperation::ResolveUsername, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_resolve_username_op()
                    .ok_or_else(|| missing(ApiOperation::ResolveUsername))?;
                op.resolve_username(object_class, username, options).await
            })
        })
        .await
    }

    pub async fn schema(&self) -> ConnectorResult<Schema> {
        self.dispatch(ApiOperation::Schema, |connector| {
            Box::pin(async move {
                let op = connector
                    .as_schema_op()
                    .ok_or_else(|| missing(ApiOperation::Schema))?;
                op.schema().await
            })
        })
        .await
    }

    pub async fn test(&self) -> ConnectorResult<()> {
        self.dispatch(ApiOperation::Test, |connector| {
            Box::pin(async move {
                let op = connector
                    .as_test_op()
                    .ok_or_else(|| missing(ApiOperation::Test))?;
                op.test().await
            })
        })
        .await
    }

    pub async fn validate(&self) -> ConnectorResult<()> {
        self.dispatch(ApiOperation::Validate, |connector| {
            Box::pin(async move { connector.validate() })
        })
        .await
    }

    /// Run a script inside the connector.
    ///
    /// Connectors without their own script support run it through the
    /// registered executor for the script's language, with the script
    /// arguments as its arguments.
    pub async fn run_script_on_connector(
        &self,
        script: &ScriptContext,
        options: &OperationOptions,
    ) -> ConnectorResult<Value> {
        let executors = &self.script_executors;
        self.dispatch(ApiOperation::ScriptOnConnector, move |connector| {
            Box::pin(async move {
                if let Some(op) = connector.as_script_on_connector_op() {
                    return op.run_script_on_connector(script, options).await;
                }
                let factory = executors
                    .get(&script.language.to_lowercase())
                    .ok_or_else(|| {
                        ConnectorError::illegal_argument(format!(
                            "no script executor for language '{}'",
                            script.language
                        ))
                    })?;
                factory
                    .new_executor(&script.text)?
                    .execute(&script.arguments)
            })
        })
        .await
    }

    pub async fn run_script_on_resource(
        &self,
        script: &ScriptContext,
        options: &OperationOptions,
    ) -> ConnectorResult<Value> {
        self.dispatch(ApiOperation::ScriptOnResource, move |connector| {
            Box::pin(async move {
                let op = connector
                    .as_script_on_resource_op()
                    .ok_or_else(|| missing(ApiOperation::ScriptOnResource))?;
                op.run_script_on_resource(script, options).await
            })
        })
        .await
    }
}

fn missing(operation: ApiOperation) -> ConnectorError {
    ConnectorError::unsupported_operation(format!("connector does not support '{operation}'"))
}

/// Applies the local filter and attribute reduction before the caller's
/// handler sees an object.
struct LocalResultsHandler<'h, 'f> {
    inner: &'h mut dyn ResultsHandler,
    filter: Option<&'f Filter>,
    attributes_to_get: Option<Vec<String>>,
    error: Option<ConnectorError>,
}

impl<'h, 'f> LocalResultsHandler<'h, 'f> {
    fn new(
        inner: &'h mut dyn ResultsHandler,
        filter: Option<&'f Filter>,
        options: &OperationOptions,
    ) -> Self {
        Self {
            inner,
            filter,
            attributes_to_get: options.attributes_to_get(),
            error: None,
        }
    }

    fn finish(self) -> ConnectorResult<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl ResultsHandler for LocalResultsHandler<'_, '_> {
    fn handle(&mut self, object: ConnectorObject) -> bool {
        if let Some(filter) = self.filter {
            match filter.accept(&object) {
                Ok(true) => {}
                Ok(false) => return true,
                Err(error) => {
                    self.error = Some(error);
                    return false;
                }
            }
        }
        let object = match &self.attributes_to_get {
            Some(names) => object.retain_attributes(names),
            None => object,
        };
        self.inner.handle(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Empty;

    impl Connector for Empty {
        fn display_name(&self) -> &str {
            "empty"
        }
    }

    fn facade(config: FacadeConfig) -> ConnectorFacade {
        let pool = Arc::new(SingleConnectorPool::new(Arc::new(Empty)));
        ConnectorFacade::new(pool, config).unwrap()
    }

    #[tokio::test]
    async fn test_unsupported_operation() {
        let err = facade(FacadeConfig::default())
            .create(&ObjectClass::account(), Vec::new(), &OperationOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[tokio::test]
    async fn test_validate_always_supported() {
        let facade = facade(FacadeConfig::default());
        assert!(facade.validate().await.is_ok());
        let supported = facade.supported_operations().await.unwrap();
        assert_eq!(supported, BTreeSet::from([ApiOperation::Validate]));
    }

    #[tokio::test]
    async fn test_disabled_operation() {
        let facade = facade(FacadeConfig::new().with_disabled_operation(ApiOperation::Validate));
        let err = facade.validate().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        assert!(facade.supported_operations().await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let pool = Arc::new(SingleConnectorPool::new(Arc::new(Empty)));
        let config = FacadeConfig::new().with_default_timeout(0);
        assert!(ConnectorFacade::new(pool, config).is_err());
    }
}
