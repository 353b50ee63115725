//! Batch Executor
//!
//! Drives one batch: for each item in input order, resolve the
//! `(resource, operation)` pair, look up the handler, resolve its
//! parameters, invoke it against the shared client and record the outcome.
//!
//! Items run strictly one after another. The isolation mode is fixed for the
//! whole batch by `ExecutionConfig::continue_on_fail`:
//!
//! - off: the first failing item aborts the batch with an `ExecutionError`
//!   and no further item is touched
//! - on: the failing item becomes `{error, itemIndex}` at its position and
//!   the loop moves on

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::{ClientFactory, ServiceClient, ServiceError};
use crate::config::ExecutionConfig;
use crate::credentials::CredentialProvider;
use crate::error::{BatchError, DispatchError, ExecutionError};
use crate::output::BatchOutput;
use crate::params::{resolve_params, ParamKind, ParamSpec, ParameterSource};
use crate::registry::{operation_registry, OperationRegistry};

const RESOURCE: ParamSpec = ParamSpec::required("resource", ParamKind::Text);
const OPERATION: ParamSpec = ParamSpec::required("operation", ParamKind::Text);

/// Per-item lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Resolved,
    Invoked,
    Succeeded,
    Isolated,
    Aborted,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemState::Pending => "pending",
            ItemState::Resolved => "resolved",
            ItemState::Invoked => "invoked",
            ItemState::Succeeded => "succeeded",
            ItemState::Isolated => "isolated",
            ItemState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Names as the host supplied them, kept for error context
#[derive(Debug, Default)]
struct ItemTarget {
    resource: String,
    operation: String,
}

pub struct BatchExecutor<'r> {
    registry: &'r OperationRegistry,
    config: ExecutionConfig,
}

impl<'r> BatchExecutor<'r> {
    pub fn new(registry: &'r OperationRegistry, config: ExecutionConfig) -> Self {
        Self { registry, config }
    }

    /// Run every item of `source` against `client`.
    ///
    /// Returns one record per item unless isolation is off and an item fails.
    pub async fn execute(
        &self,
        client: &dyn ServiceClient,
        source: &dyn ParameterSource,
    ) -> Result<BatchOutput, ExecutionError> {
        let item_count = source.item_count();
        let mut output = BatchOutput::with_capacity(item_count);

        for item_index in 0..item_count {
            debug!(item_index, state = %ItemState::Pending);
            let mut target = ItemTarget::default();

            match self
                .process_item(client, source, item_index, &mut target)
                .await
            {
                Ok(data) => {
                    debug!(item_index, state = %ItemState::Succeeded);
                    output.push_success(data);
                }
                Err(err) if self.config.continue_on_fail => {
                    warn!(
                        item_index,
                        resource = %target.resource,
                        operation = %target.operation,
                        kind = err.kind(),
                        state = %ItemState::Isolated,
                        "item failed: {err}"
                    );
                    output.push_isolated(err.to_string());
                }
                Err(err) => {
                    debug!(item_index, state = %ItemState::Aborted);
                    return Err(ExecutionError::new(
                        err,
                        target.resource,
                        target.operation,
                        item_index,
                    ));
                }
            }
        }

        Ok(output)
    }

    async fn process_item(
        &self,
        client: &dyn ServiceClient,
        source: &dyn ParameterSource,
        item_index: usize,
        target: &mut ItemTarget,
    ) -> Result<Value, DispatchError> {
        target.resource = resolve_name(source, item_index, &RESOURCE)?;
        target.operation = resolve_name(source, item_index, &OPERATION)?;

        let handler = self.registry.lookup(&target.resource, &target.operation)?;
        let params = resolve_params(source, item_index, handler.params())?;
        debug!(item_index, key = %handler.key(), params = params.len(), state = %ItemState::Resolved);

        debug!(item_index, state = %ItemState::Invoked);
        let invocation = handler.execute(client, &params);
        match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, invocation)
                .await
                .map_err(|_| {
                    DispatchError::ExternalService(ServiceError::new(format!(
                        "operation timed out after {}ms",
                        limit.as_millis()
                    )))
                })?,
            None => invocation.await,
        }
    }
}

fn resolve_name(
    source: &dyn ParameterSource,
    item_index: usize,
    spec: &ParamSpec,
) -> Result<String, DispatchError> {
    let resolved = resolve_params(source, item_index, std::slice::from_ref(spec))?;
    Ok(resolved.text(spec.name)?.to_string())
}

/// Run a batch end to end.
///
/// Credentials are resolved and the client is built once, before the first
/// item; failures there abort the batch regardless of the isolation mode.
pub async fn run_batch(
    credentials: &dyn CredentialProvider,
    factory: &dyn ClientFactory,
    source: &dyn ParameterSource,
    config: &ExecutionConfig,
) -> Result<BatchOutput, BatchError> {
    run_batch_with(operation_registry(), credentials, factory, source, config).await
}

/// `run_batch` against an explicit registry
pub async fn run_batch_with(
    registry: &OperationRegistry,
    credentials: &dyn CredentialProvider,
    factory: &dyn ClientFactory,
    source: &dyn ParameterSource,
    config: &ExecutionConfig,
) -> Result<BatchOutput, BatchError> {
    let batch_id = Uuid::new_v4();
    let item_count = source.item_count();
    let span = info_span!("batch", %batch_id, items = item_count);

    async move {
        info!(
            continue_on_fail = config.continue_on_fail,
            credential_id = %config.credential_id,
            "Starting batch of {} items",
            item_count
        );

        let api_credentials = credentials.resolve(&config.credential_id).await?;
        let client = factory
            .connect(&api_credentials)
            .await
            .map_err(BatchError::Connect)?;

        let executor = BatchExecutor::new(registry, config.clone());
        let output = executor.execute(client.as_ref(), source).await?;

        info!(
            succeeded = output.success_count(),
            isolated = output.isolated_count(),
            "Batch complete"
        );
        Ok(output)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dry_run::DryRunClient;
    use crate::params::JsonItems;
    use serde_json::json;

    fn items(value: Value) -> JsonItems {
        let items = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        JsonItems::new(items)
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let registry = OperationRegistry::new();
        let executor = BatchExecutor::new(&registry, ExecutionConfig::default());
        let output = executor
            .execute(&DryRunClient::new(), &JsonItems::default())
            .await
            .unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_missing_resource_is_item_failure() {
        let registry = OperationRegistry::new();
        let executor = BatchExecutor::new(
            &registry,
            ExecutionConfig::default().continue_on_fail(true),
        );
        let source = items(json!([{"operation": "watch"}]));
        let output = executor.execute(&DryRunClient::new(), &source).await.unwrap();
        assert_eq!(
            output.records()[0].error(),
            Some("Missing required parameter 'resource'")
        );
    }

    #[tokio::test]
    async fn test_abort_keeps_host_names() {
        let registry = OperationRegistry::new();
        let executor = BatchExecutor::new(&registry, ExecutionConfig::default());
        let source = items(json!([
            {"resource": "user", "operation": "generateToken", "userId": "u1"},
            {"resource": "user", "operation": "upsertUser", "userId": "u2", "userData": "{bad"},
        ]));
        let err = executor
            .execute(&DryRunClient::new(), &source)
            .await
            .unwrap_err();
        assert_eq!(err.resource, "user");
        assert_eq!(err.operation, "upsertUser");
        assert_eq!(err.item_index, 1);
        assert!(matches!(err.source, DispatchError::Parameter(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout() {
        let registry = OperationRegistry::new();
        let config = ExecutionConfig::default()
            .continue_on_fail(true)
            .with_call_timeout(std::time::Duration::from_millis(250));
        let executor = BatchExecutor::new(&registry, config);
        let client = DryRunClient::new().with_delay(std::time::Duration::from_secs(5));
        let source = items(json!([
            {"resource": "user", "operation": "deactivateUser", "userId": "u1"},
            {"resource": "user", "operation": "generateToken", "userId": "u1"},
        ]));
        let output = executor.execute(&client, &source).await.unwrap();
        assert_eq!(
            output.records()[0].error(),
            Some("operation timed out after 250ms")
        );
        // local calls never sleep
        assert!(output.records()[1].is_success());
    }

    #[test]
    fn test_item_state_display() {
        assert_eq!(ItemState::Isolated.to_string(), "isolated");
        assert_eq!(ItemState::Aborted.to_string(), "aborted");
    }
}
