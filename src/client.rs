//! Service client capability
//!
//! The dispatch core never talks to the chat service directly. Handlers
//! describe each remote call as a `ServiceCall` and hand it to an
//! already-authenticated `ServiceClient`; the client owns transport,
//! retries and internal locking.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::credentials::ApiCredentials;

/// Rejection reported by the service client. The message is passed through verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ClientResult<T> = Result<T, ServiceError>;

/// Channel address: `type` plus `id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelRef {
    #[serde(rename = "type")]
    pub channel_type: String,
    pub id: String,
}

impl ChannelRef {
    pub fn new(channel_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            channel_type: channel_type.into(),
            id: id.into(),
        }
    }

    /// Compound identifier `type:id`
    pub fn cid(&self) -> String {
        format!("{}:{}", self.channel_type, self.id)
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_type, self.id)
    }
}

/// One remote call. Payload documents are forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum ServiceCall {
    // User
    UpsertUser {
        user: Value,
    },
    UpsertUsers {
        users: Value,
    },
    QueryUsers {
        filter: Value,
        sort: Value,
        options: Value,
    },
    DeactivateUser {
        user_id: String,
    },

    // Channel
    QueryChannels {
        filter: Value,
        sort: Value,
        options: Value,
    },
    /// `data` never carries an empty `members` collection
    CreateChannel {
        channel: ChannelRef,
        data: Map<String, Value>,
    },
    UpdateChannel {
        channel: ChannelRef,
        data: Value,
    },
    DeleteChannel {
        channel: ChannelRef,
        options: Value,
    },
    TruncateChannel {
        channel: ChannelRef,
        options: Value,
    },
    WatchChannel {
        channel: ChannelRef,
    },
    StopWatching {
        channel: ChannelRef,
    },
    AddMembers {
        channel: ChannelRef,
        members: Vec<String>,
    },
    RemoveMembers {
        channel: ChannelRef,
        members: Vec<String>,
    },
    AddModerators {
        channel: ChannelRef,
        members: Vec<String>,
    },
    DemoteModerators {
        channel: ChannelRef,
        members: Vec<String>,
    },
    InviteMembers {
        channel: ChannelRef,
        members: Vec<String>,
    },
    AcceptInvite {
        channel: ChannelRef,
    },
    RejectInvite {
        channel: ChannelRef,
    },
    QueryMembers {
        channel: ChannelRef,
        filter: Value,
        sort: Value,
        options: Value,
    },
    HideChannel {
        channel: ChannelRef,
        user_id: Option<String>,
        clear_history: bool,
    },
    ShowChannel {
        channel: ChannelRef,
        user_id: Option<String>,
    },
    ArchiveChannel {
        channel: ChannelRef,
        options: Value,
    },
    UnarchiveChannel {
        channel: ChannelRef,
        options: Value,
    },
    PinChannel {
        channel: ChannelRef,
        options: Value,
    },
    UnpinChannel {
        channel: ChannelRef,
        options: Value,
    },
    MuteChannel {
        channel: ChannelRef,
        options: Value,
    },
    UnmuteChannel {
        channel: ChannelRef,
        options: Value,
    },
    MarkRead {
        channel: ChannelRef,
    },
    MarkUnread {
        channel: ChannelRef,
        options: Value,
    },
    SendFile {
        channel: ChannelRef,
        path: String,
        name: String,
    },
    SendImage {
        channel: ChannelRef,
        path: String,
        name: String,
    },
    DeleteFile {
        channel: ChannelRef,
        url: String,
    },
    DeleteImage {
        channel: ChannelRef,
        url: String,
    },
    BanChannelMember {
        channel: ChannelRef,
        target_user_id: String,
        options: Value,
    },
    UnbanChannelMember {
        channel: ChannelRef,
        target_user_id: String,
    },
    EnableSlowMode {
        channel: ChannelRef,
        cooldown_seconds: i64,
    },
    DisableSlowMode {
        channel: ChannelRef,
    },
    SendAction {
        channel: ChannelRef,
        message_id: String,
        form_data: Value,
    },

    // Message
    SendMessage {
        channel: ChannelRef,
        message: Value,
    },
    UpdateMessage {
        message: Value,
    },
    DeleteMessage {
        message_id: String,
    },
    SearchMessages {
        filter: Value,
        query: String,
    },

    // Moderation (global, not channel scoped)
    BanUser {
        target_user_id: String,
        options: Value,
    },
    UnbanUser {
        target_user_id: String,
    },
    ShadowBan {
        target_user_id: String,
        options: Value,
    },
    RemoveShadowBan {
        target_user_id: String,
    },
    MuteUser {
        target_user_id: String,
        options: Value,
    },
    UnmuteUser {
        target_user_id: String,
    },
    FlagUser {
        target_user_id: String,
        options: Value,
    },
    UnflagUser {
        target_user_id: String,
    },
    FlagMessage {
        message_id: String,
        options: Value,
    },
    UnflagMessage {
        message_id: String,
    },
    QueryBannedUsers {
        filter: Value,
        sort: Value,
        options: Value,
    },
    QueryFlags {
        filter: Value,
        options: Value,
    },
    QueryMessageFlags {
        filter: Value,
        options: Value,
    },
    ReviewFlag {
        flag_id: String,
        action: String,
    },
}

/// Authenticated handle to the remote chat service.
///
/// Shared read-only by the executor for the duration of one batch.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Perform one remote call
    async fn execute(&self, call: ServiceCall) -> ClientResult<Value>;

    /// Sign a user token locally
    fn create_token(&self, user_id: &str) -> ClientResult<String>;

    /// Locally cached mute state of a channel
    fn mute_status(&self, channel: &ChannelRef) -> ClientResult<Value>;

    /// Locally cached channel configuration
    fn channel_config(&self, channel: &ChannelRef) -> ClientResult<Value>;
}

/// Builds the batch's shared client from resolved credentials
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connect(&self, credentials: &ApiCredentials) -> ClientResult<Arc<dyn ServiceClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_ref_cid() {
        let channel = ChannelRef::new("messaging", "general");
        assert_eq!(channel.cid(), "messaging:general");
        assert_eq!(channel.to_string(), "messaging:general");
    }

    #[test]
    fn test_service_call_serializes_tagged() {
        let call = ServiceCall::SendMessage {
            channel: ChannelRef::new("messaging", "general"),
            message: json!({"text": "hi", "user_id": "u2"}),
        };
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "call": "sendMessage",
                "channel": {"type": "messaging", "id": "general"},
                "message": {"text": "hi", "user_id": "u2"}
            })
        );
    }
}
