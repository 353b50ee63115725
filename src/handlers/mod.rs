//! Operation handlers
//!
//! One handler per `(resource, operation)` pair, grouped by resource. Each
//! handler declares its parameters and turns the resolved values into a
//! single `ServiceCall` (or local client call). Remote semantics belong to
//! the service client; handlers only shape the request.
//!
//! ## Payload shaping rules
//!
//! - Member lists are already normalised by the resolver; channel creation
//!   omits `members` entirely when the list is empty
//! - `type:id` channel identifiers split on the first colon only
//! - Optional moderation fields (`ip_ban`, `user_agent`) appear only when the
//!   corresponding input is non-empty

mod channel;
mod message;
mod moderation;
mod user;

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::ParameterError;
use crate::operation::OperationKey;
use crate::params::{ParamKind, ParamSpec, ResolvedParams};
use crate::registry::OperationHandler;

/// Defines a unit-struct handler and its `OperationHandler` impl.
macro_rules! operation_handler {
    (
        $(#[$meta:meta])*
        $name:ident => $key:expr,
        $description:expr,
        params: [$($spec:expr),* $(,)?],
        |$client:ident, $params:ident| { $($body:tt)* }
    ) => {
        $(#[$meta])*
        pub struct $name;

        #[async_trait::async_trait]
        impl $crate::registry::OperationHandler for $name {
            fn key(&self) -> $crate::operation::OperationKey {
                $key
            }

            fn description(&self) -> &'static str {
                $description
            }

            fn params(&self) -> &'static [$crate::params::ParamSpec] {
                const PARAMS: &[$crate::params::ParamSpec] = &[$($spec),*];
                PARAMS
            }

            async fn execute(
                &self,
                $client: &dyn $crate::client::ServiceClient,
                $params: &$crate::params::ResolvedParams,
            ) -> Result<serde_json::Value, $crate::error::DispatchError> {
                $($body)*
            }
        }
    };
}

pub(crate) use operation_handler;

// ============================================================================
// Shared parameter specs
// ============================================================================

pub(crate) const CHANNEL_TYPE: ParamSpec =
    ParamSpec::optional("channelType", ParamKind::Text).or_text("messaging");
pub(crate) const CHANNEL_ID: ParamSpec = ParamSpec::required("channelId", ParamKind::Text);
pub(crate) const CHANNEL_CID: ParamSpec = ParamSpec::required("channelCid", ParamKind::Text);
pub(crate) const USER_ID: ParamSpec = ParamSpec::required("userId", ParamKind::Text);
pub(crate) const OPTIONAL_USER_ID: ParamSpec = ParamSpec::optional("userId", ParamKind::Text);
pub(crate) const TARGET_USER_ID: ParamSpec =
    ParamSpec::required("targetUserId", ParamKind::Text);
pub(crate) const MESSAGE_ID: ParamSpec = ParamSpec::required("messageId", ParamKind::Text);
pub(crate) const MEMBERS: ParamSpec = ParamSpec::optional("members", ParamKind::StringList);
pub(crate) const QUERY_FILTER: ParamSpec =
    ParamSpec::optional("queryFilter", ParamKind::JsonDocument);
pub(crate) const QUERY_SORT: ParamSpec = ParamSpec::optional("querySort", ParamKind::JsonDocument);
pub(crate) const FILTER_QUERY: ParamSpec =
    ParamSpec::optional("filterQuery", ParamKind::JsonDocument);
pub(crate) const LIMIT: ParamSpec = ParamSpec::optional("limit", ParamKind::Integer).or_integer(50);
pub(crate) const REASON: ParamSpec = ParamSpec::optional("reason", ParamKind::Text);
pub(crate) const TIMEOUT: ParamSpec =
    ParamSpec::optional("timeout", ParamKind::Integer).or_integer(60);

// ============================================================================
// Payload helpers
// ============================================================================

/// `{limit}` options document
pub(crate) fn limit_options(params: &ResolvedParams) -> Result<Value, ParameterError> {
    Ok(json!({ "limit": params.integer("limit")? }))
}

/// `{id: <id>, ...extra}`; keys from `extra` win on conflict
pub(crate) fn with_id(id: &str, extra: &Map<String, Value>) -> Value {
    let mut doc = Map::new();
    doc.insert("id".to_string(), Value::String(id.to_string()));
    doc.extend(extra.clone());
    Value::Object(doc)
}

/// `{user_id}` options document
pub(crate) fn user_options(params: &ResolvedParams) -> Result<Value, ParameterError> {
    Ok(json!({ "user_id": params.text("userId")? }))
}

/// Handler for a declared pair. Exhaustive: a new operation variant does not
/// compile until it has a handler.
pub fn handler_for(key: OperationKey) -> Arc<dyn OperationHandler> {
    match key {
        OperationKey::User(op) => user::handler(op),
        OperationKey::Channel(op) => channel::handler(op),
        OperationKey::Message(op) => message::handler(op),
        OperationKey::Moderation(op) => moderation::handler(op),
    }
}
