//! Facade configuration
//!
//! Cross-cutting settings applied by [`ConnectorFacade`](crate::facade::ConnectorFacade)
//! around every API call.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};
use crate::types::ApiOperation;

/// Settings for the facade dispatch layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeConfig {
    /// Per-operation timeout in milliseconds.
    #[serde(default)]
    pub timeouts: BTreeMap<ApiOperation, u64>,

    /// Timeout for operations without an entry in `timeouts`.
    /// Absent means the call is not bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout_ms: Option<u64>,

    /// Operations refused even when the connector implements them.
    #[serde(default)]
    pub disabled_operations: BTreeSet<ApiOperation>,

    /// Re-apply the search filter to the objects a connector returns.
    #[serde(default)]
    pub filter_results_locally: bool,

    /// Emit entry/exit events for every operation.
    #[serde(default = "default_log_operations")]
    pub log_operations: bool,
}

fn default_log_operations() -> bool {
    true
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            timeouts: BTreeMap::new(),
            default_timeout_ms: None,
            disabled_operations: BTreeSet::new(),
            filter_results_locally: false,
            log_operations: default_log_operations(),
        }
    }
}

impl FacadeConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a configuration from JSON.
    pub fn from_json(json: &str) -> ConnectorResult<Self> {
        let config: FacadeConfig = serde_json::from_str(json).map_err(|e| {
            ConnectorError::configuration(format!("invalid facade configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the timeout of one operation.
    pub fn with_timeout(mut self, operation: ApiOperation, millis: u64) -> Self {
        self.timeouts.insert(operation, millis);
        self
    }

    /// Set the fallback timeout.
    pub fn with_default_timeout(mut self, millis: u64) -> Self {
        self.default_timeout_ms = Some(millis);
        self
    }

    /// Refuse an operation.
    pub fn with_disabled_operation(mut self, operation: ApiOperation) -> Self {
        self.disabled_operations.insert(operation);
        self
    }

    pub fn with_filter_results_locally(mut self, enabled: bool) -> Self {
        self.filter_results_locally = enabled;
        self
    }

    pub fn with_log_operations(mut self, enabled: bool) -> Self {
        self.log_operations = enabled;
        self
    }

    /// Timeout applied to `operation`, if any.
    pub fn timeout_for(&self, operation: ApiOperation) -> Option<Duration> {
        self.timeouts
            .get(&operation)
            .copied()
            .or(self.default_timeout_ms)
            .map(Duration::from_millis)
    }

    /// Check if the configuration disables `operation`.
    pub fn is_disabled(&self, operation: ApiOperation) -> bool {
        self.disabled_operations.contains(&operation)
    }

    /// Validate the configuration.
    ///
    /// A zero timeout would fail every call before it starts.
    pub fn validate(&self) -> ConnectorResult<()> {
        if let Some((operation, _)) = self.timeouts.iter().find(|(_, millis)| **millis == 0) {
            return Err(ConnectorError::configuration(format!(
                "timeout for '{operation}' must be greater than zero"
            )));
        }
        if self.default_timeout_ms == Some(0) {
            return Err(ConnectorError::configuration(
                "default timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = FacadeConfig::default();
        assert!(config.log_operations);
        assert!(!config.filter_results_locally);
        assert_eq!(config.timeout_for(ApiOperation::Search), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_fallback() {
        let config = FacadeConfig::new()
            .with_default_timeout(5_000)
            .with_timeout(ApiOperation::Search, 60_000);
        assert_eq!(
            config.timeout_for(ApiOperation::Search),
            Some(Duration::from_secs(60))
        );
        assert_eq!(
            config.timeout_for(ApiOperation::Create),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_from_json() {
        let config = FacadeConfig::from_json(
            r#"{
                "timeouts": {"search": 1000, "get_latest_sync_token": 250},
                "disabled_operations": ["delete"],
                "filter_results_locally": true
            }"#,
        )
        .unwrap();

        assert!(config.is_disabled(ApiOperation::Delete));
        assert!(!config.is_disabled(ApiOperation::Create));
        assert!(config.filter_results_locally);
        assert!(config.log_operations);
        assert_eq!(
            config.timeout_for(ApiOperation::GetLatestSyncToken),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_operation() {
        let err = FacadeConfig::from_json(r#"{"disabled_operations": ["explode"]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = FacadeConfig::new().with_timeout(ApiOperation::Get, 0);
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Configuration);

        let config = FacadeConfig::new().with_default_timeout(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = FacadeConfig::new()
            .with_timeout(ApiOperation::Sync, 10)
            .with_disabled_operation(ApiOperation::ScriptOnResource)
            .with_log_operations(false);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: FacadeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
