//! Chat Dispatch
//!
//! Batch command dispatch in front of a chat service client. Each input
//! item names a `(resource, operation)` pair plus its parameters; the
//! executor routes it to exactly one handler, resolves and coerces the
//! parameters, invokes the shared client and collects one output record per
//! item in input order.
//!
//! ## Modules
//!
//! - `operation`: closed enums for resources and operations
//! - `params`: parameter specs and host-side resolution
//! - `registry` / `handlers`: one handler per pair
//! - `executor`: the batch loop and its failure-isolation policy
//! - `client` / `credentials`: external capabilities the core consumes
//! - `dry_run`: recording client for harness runs and tests
//!
//! ## Example
//!
//! ```ignore
//! use chat_dispatch::{run_batch, DryRunClientFactory, ExecutionConfig, JsonItems, StaticCredentialProvider};
//!
//! let items = JsonItems::from_json_str(r#"[{"resource": "user", "operation": "generateToken", "userId": "u1"}]"#)?;
//! let credentials = StaticCredentialProvider::new().with("stream_chat", "key", "secret");
//! let output = run_batch(&credentials, &DryRunClientFactory::default(), &items, &ExecutionConfig::default()).await?;
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod dry_run;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod operation;
pub mod output;
pub mod params;
pub mod registry;

pub use client::{ChannelRef, ClientFactory, ServiceCall, ServiceClient, ServiceError};
pub use config::ExecutionConfig;
pub use credentials::{
    ApiCredentials, CredentialProvider, EnvCredentialProvider, StaticCredentialProvider,
};
pub use dry_run::{DryRunClient, DryRunClientFactory, RecordedCall};
pub use error::{BatchError, CredentialError, DispatchError, ExecutionError, ParameterError};
pub use executor::{run_batch, run_batch_with, BatchExecutor, ItemState};
pub use operation::{OperationKey, Resource};
pub use output::{BatchOutput, OutputRecord};
pub use params::{JsonItems, ParameterSource};
pub use registry::{operation_registry, OperationHandler, OperationRegistry};
