//! Operation Registry
//!
//! Maps every `(resource, operation)` pair to exactly one handler. The
//! registry is built once per process from the exhaustive
//! `handlers::handler_for` table; lookups never fall back to a default
//! handler.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::ServiceClient;
use crate::error::DispatchError;
use crate::handlers;
use crate::operation::OperationKey;
use crate::params::{ParamSpec, ResolvedParams};

/// A handler for one `(resource, operation)` pair
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// The pair this handler serves
    fn key(&self) -> OperationKey;

    /// Short human-readable action
    fn description(&self) -> &'static str;

    /// Parameters resolved for each item before `execute`
    fn params(&self) -> &'static [ParamSpec];

    /// Invoke the service client with resolved parameters
    async fn execute(
        &self,
        client: &dyn ServiceClient,
        params: &ResolvedParams,
    ) -> Result<Value, DispatchError>;
}

/// Registry of operation handlers
pub struct OperationRegistry {
    handlers: HashMap<OperationKey, Arc<dyn OperationHandler>>,
}

impl OperationRegistry {
    /// Registry covering the full catalog
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for key in OperationKey::all() {
            registry.register(handlers::handler_for(key));
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its own key, returning any handler it displaced
    pub fn register(
        &mut self,
        handler: Arc<dyn OperationHandler>,
    ) -> Option<Arc<dyn OperationHandler>> {
        let key = handler.key();
        let displaced = self.handlers.insert(key, handler);
        if displaced.is_some() {
            warn!(%key, "handler registered twice, keeping the latest");
        }
        displaced
    }

    pub fn get(&self, key: OperationKey) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.get(&key).cloned()
    }

    /// Resolve host-supplied names to a handler
    pub fn lookup(
        &self,
        resource: &str,
        operation: &str,
    ) -> Result<Arc<dyn OperationHandler>, DispatchError> {
        let key = OperationKey::parse(resource, operation)?;
        self.get(key)
            .ok_or_else(|| DispatchError::unsupported(resource, operation))
    }

    pub fn has(&self, key: OperationKey) -> bool {
        self.handlers.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// All registered pairs with their descriptions, in catalog order
    pub fn list(&self) -> Vec<(OperationKey, &'static str)> {
        let mut entries: Vec<_> = self
            .handlers
            .iter()
            .map(|(key, handler)| (*key, handler.description()))
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static OPERATION_REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();

/// Process-wide registry, built on first access
pub fn operation_registry() -> &'static OperationRegistry {
    OPERATION_REGISTRY.get_or_init(|| {
        let registry = OperationRegistry::new();
        info!("Loaded operation registry: {} operations", registry.len());
        registry
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_is_complete() {
        let registry = OperationRegistry::new();
        assert_eq!(registry.len(), OperationKey::all().len());
        for key in OperationKey::all() {
            assert!(registry.has(key), "no handler for {key}");
        }
    }

    #[test]
    fn test_each_pair_resolves_to_its_own_handler() {
        let registry = OperationRegistry::new();
        for key in OperationKey::all() {
            let handler = registry
                .lookup(key.resource().as_str(), key.operation())
                .unwrap();
            assert_eq!(handler.key(), key);
        }
    }

    #[test]
    fn test_param_names_unique_per_handler() {
        let registry = OperationRegistry::new();
        for (key, _) in registry.list() {
            let handler = registry.get(key).unwrap();
            let names: HashSet<_> = handler.params().iter().map(|p| p.name).collect();
            assert_eq!(names.len(), handler.params().len(), "duplicate param in {key}");
        }
    }

    #[test]
    fn test_lookup_unsupported() {
        let registry = OperationRegistry::new();
        let err = registry.lookup("channel", "doesNotExist").err().unwrap();
        assert_eq!(err.to_string(), "Unsupported operation: channel.doesNotExist");
    }

    #[test]
    fn test_empty_registry_rejects_known_pair() {
        let registry = OperationRegistry::empty();
        assert!(registry.is_empty());
        let err = registry.lookup("user", "generateToken").err().unwrap();
        assert!(matches!(err, DispatchError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_register_reports_displaced() {
        let mut registry = OperationRegistry::empty();
        let key = OperationKey::all()[0];
        assert!(registry.register(handlers::handler_for(key)).is_none());
        assert!(registry.register(handlers::handler_for(key)).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_global_registry() {
        assert_eq!(operation_registry().len(), 60);
        assert!(std::ptr::eq(operation_registry(), operation_registry()));
    }
}
