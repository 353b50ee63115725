//! Dry-run service client
//!
//! Records every call in order and answers with an echo of the request
//! instead of reaching the network. Backs the `dispatch_batch` harness and
//! the tests; failures can be injected per call to exercise
//! the isolation policy.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::{
    ChannelRef, ClientFactory, ClientResult, ServiceCall, ServiceClient, ServiceError,
};
use crate::credentials::ApiCredentials;

type CallPredicate = Box<dyn Fn(&ServiceCall) -> bool + Send + Sync>;

struct InjectedFailure {
    matches: CallPredicate,
    message: String,
}

/// Anything the client was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Remote(ServiceCall),
    CreateToken { user_id: String },
    MuteStatus { channel: ChannelRef },
    ChannelConfig { channel: ChannelRef },
}

#[derive(Default)]
pub struct DryRunClient {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Vec<InjectedFailure>,
    delay: Option<Duration>,
}

impl DryRunClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject remote calls matching `matches` with `message`
    pub fn fail_when<F>(mut self, matches: F, message: impl Into<String>) -> Self
    where
        F: Fn(&ServiceCall) -> bool + Send + Sync + 'static,
    {
        self.failures.push(InjectedFailure {
            matches: Box::new(matches),
            message: message.into(),
        });
        self
    }

    /// Sleep before answering each remote call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Snapshot of the calls recorded so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    /// Remote calls only
    pub fn remote_calls(&self) -> Vec<ServiceCall> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Remote(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        // A panic while holding the lock cannot leave the Vec half-written
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: RecordedCall) {
        self.lock().push(call);
    }
}

#[async_trait]
impl ServiceClient for DryRunClient {
    async fn execute(&self, call: ServiceCall) -> ClientResult<Value> {
        debug!(?call, "dry-run call");
        self.record(RecordedCall::Remote(call.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = self.failures.iter().find(|f| (f.matches)(&call)) {
            return Err(ServiceError::new(failure.message.clone()));
        }

        let request = serde_json::to_value(&call)
            .map_err(|e| ServiceError::new(format!("failed to encode request: {e}")))?;
        Ok(json!({ "dry_run": true, "request": request }))
    }

    fn create_token(&self, user_id: &str) -> ClientResult<String> {
        self.record(RecordedCall::CreateToken {
            user_id: user_id.to_string(),
        });
        Ok(format!("dry-run-token-{user_id}"))
    }

    fn mute_status(&self, channel: &ChannelRef) -> ClientResult<Value> {
        self.record(RecordedCall::MuteStatus {
            channel: channel.clone(),
        });
        Ok(json!({ "muted": false, "createdAt": null, "expiresAt": null }))
    }

    fn channel_config(&self, channel: &ChannelRef) -> ClientResult<Value> {
        self.record(RecordedCall::ChannelConfig {
            channel: channel.clone(),
        });
        Ok(json!({ "name": channel.channel_type, "dry_run": true }))
    }
}

/// Hands out one shared `DryRunClient` regardless of credentials
#[derive(Clone, Default)]
pub struct DryRunClientFactory {
    client: Arc<DryRunClient>,
}

impl DryRunClientFactory {
    pub fn new(client: Arc<DryRunClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Arc<DryRunClient> {
        Arc::clone(&self.client)
    }
}

#[async_trait]
impl ClientFactory for DryRunClientFactory {
    async fn connect(&self, credentials: &ApiCredentials) -> ClientResult<Arc<dyn ServiceClient>> {
        debug!(api_key = %credentials.api_key, "connecting dry-run client");
        let client: Arc<dyn ServiceClient> = self.client.clone();
        Ok(client)
    }
}
