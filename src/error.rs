//! Error handling for the dispatch core
//!
//! Per-item failures (`DispatchError`) are routed through the batch's
//! isolation policy. `CredentialError` and client construction failures
//! happen before the first item and always abort the batch.

use thiserror::Error;

use crate::client::ServiceError;

/// Credential lookup failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Missing credentials '{id}': {field} is not set")]
    MissingField { id: String, field: &'static str },

    #[error("Credential lookup for '{id}' failed: {message}")]
    Lookup { id: String, message: String },
}

/// Parameter extraction and coercion failures (local to one item)
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Missing required parameter '{name}'")]
    Missing { name: String },

    #[error("Parameter '{name}' expected {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid JSON in parameter '{name}': {source}")]
    InvalidJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parameter '{name}' must be a JSON object")]
    NotAnObject { name: String },

    #[error("Invalid channel CID '{value}': expected 'type:id'")]
    InvalidChannelCid { value: String },
}

/// Any failure while handling a single batch item
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("Unsupported operation: {resource}.{operation}")]
    UnsupportedOperation { resource: String, operation: String },

    #[error(transparent)]
    ExternalService(#[from] ServiceError),
}

impl DispatchError {
    pub fn unsupported(resource: &str, operation: &str) -> Self {
        DispatchError::UnsupportedOperation {
            resource: resource.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Stable kind label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Parameter(_) => "PARAMETER",
            DispatchError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            DispatchError::ExternalService(_) => "EXTERNAL_SERVICE",
        }
    }
}

/// A per-item failure with enough context to locate the item and operation
#[derive(Error, Debug)]
#[error("{message} (error in {resource}.{operation} operation, item {item_index})")]
pub struct ExecutionError {
    pub message: String,
    pub resource: String,
    pub operation: String,
    pub item_index: usize,
    #[source]
    pub source: DispatchError,
}

impl ExecutionError {
    pub fn new(
        source: DispatchError,
        resource: impl Into<String>,
        operation: impl Into<String>,
        item_index: usize,
    ) -> Self {
        Self {
            message: source.to_string(),
            resource: resource.into(),
            operation: operation.into(),
            item_index,
            source,
        }
    }
}

/// Outcome of a batch call that produced no output sequence
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Failed to construct service client: {0}")]
    Connect(#[source] ServiceError),

    #[error(transparent)]
    Aborted(#[from] ExecutionError),
}
