//! Channel operations
//!
//! Everything except `queryChannels` addresses one channel through the
//! `channelType` / `channelId` pair.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::{
    limit_options, operation_handler, user_options, CHANNEL_ID, CHANNEL_TYPE, LIMIT, MEMBERS,
    MESSAGE_ID, OPTIONAL_USER_ID, QUERY_FILTER, QUERY_SORT, TARGET_USER_ID,
};
use crate::client::ServiceCall;
use crate::operation::{ChannelOp, OperationKey};
use crate::params::{ParamKind, ParamSpec};
use crate::registry::OperationHandler;

const CHANNEL_DATA: ParamSpec = ParamSpec::optional("channelData", ParamKind::JsonDocument);
const HARD_DELETE: ParamSpec = ParamSpec::optional("hardDelete", ParamKind::Boolean);
const TRUNCATE_OPTIONS: ParamSpec =
    ParamSpec::optional("truncateOptions", ParamKind::JsonDocument);
const CLEAR_HISTORY: ParamSpec = ParamSpec::optional("clearHistory", ParamKind::Boolean);
const MUTE_EXPIRATION: ParamSpec =
    ParamSpec::optional("muteExpiration", ParamKind::Integer).or_integer(60);
const MESSAGE_ID_UNREAD: ParamSpec = ParamSpec::required("messageIdUnread", ParamKind::Text);
const FILE_PATH: ParamSpec = ParamSpec::required("filePath", ParamKind::Text);
const FILE_NAME: ParamSpec = ParamSpec::required("fileName", ParamKind::Text);
const FILE_URL: ParamSpec = ParamSpec::required("fileUrl", ParamKind::Text);
const BAN_REASON: ParamSpec = ParamSpec::optional("banReason", ParamKind::Text);
const BAN_TIMEOUT: ParamSpec = ParamSpec::optional("banTimeout", ParamKind::Integer).or_integer(60);
const COOLDOWN_INTERVAL: ParamSpec =
    ParamSpec::optional("cooldownInterval", ParamKind::Integer).or_integer(5);
const FORM_DATA: ParamSpec = ParamSpec::optional("formData", ParamKind::JsonDocument);

pub(super) fn handler(op: ChannelOp) -> Arc<dyn OperationHandler> {
    match op {
        ChannelOp::CreateChannel => Arc::new(CreateChannelOp),
        ChannelOp::UpdateChannel => Arc::new(UpdateChannelOp),
        ChannelOp::DeleteChannel => Arc::new(DeleteChannelOp),
        ChannelOp::Truncate => Arc::new(TruncateOp),
        ChannelOp::Watch => Arc::new(WatchOp),
        ChannelOp::StopWatching => Arc::new(StopWatchingOp),
        ChannelOp::AddMembers => Arc::new(AddMembersOp),
        ChannelOp::RemoveMembers => Arc::new(RemoveMembersOp),
        ChannelOp::AddModerators => Arc::new(AddModeratorsOp),
        ChannelOp::DemoteModerators => Arc::new(DemoteModeratorsOp),
        ChannelOp::InviteMembers => Arc::new(InviteMembersOp),
        ChannelOp::AcceptInvite => Arc::new(AcceptInviteOp),
        ChannelOp::RejectInvite => Arc::new(RejectInviteOp),
        ChannelOp::QueryChannels => Arc::new(QueryChannelsOp),
        ChannelOp::QueryMembers => Arc::new(QueryMembersOp),
        ChannelOp::Hide => Arc::new(HideOp),
        ChannelOp::Show => Arc::new(ShowOp),
        ChannelOp::Archive => Arc::new(ArchiveOp),
        ChannelOp::Unarchive => Arc::new(UnarchiveOp),
        ChannelOp::Pin => Arc::new(PinOp),
        ChannelOp::Unpin => Arc::new(UnpinOp),
        ChannelOp::Mute => Arc::new(MuteOp),
        ChannelOp::Unmute => Arc::new(UnmuteOp),
        ChannelOp::MuteStatus => Arc::new(MuteStatusOp),
        ChannelOp::MarkRead => Arc::new(MarkReadOp),
        ChannelOp::MarkUnread => Arc::new(MarkUnreadOp),
        ChannelOp::SendFile => Arc::new(SendFileOp),
        ChannelOp::SendImage => Arc::new(SendImageOp),
        ChannelOp::DeleteFile => Arc::new(DeleteFileOp),
        ChannelOp::DeleteImage => Arc::new(DeleteImageOp),
        ChannelOp::BanUser => Arc::new(BanChannelUserOp),
        ChannelOp::UnbanUser => Arc::new(UnbanChannelUserOp),
        ChannelOp::EnableSlowMode => Arc::new(EnableSlowModeOp),
        ChannelOp::DisableSlowMode => Arc::new(DisableSlowModeOp),
        ChannelOp::SendAction => Arc::new(SendActionOp),
        ChannelOp::GetConfig => Arc::new(GetConfigOp),
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

operation_handler! {
    /// An empty member list sends no `members` key at all.
    CreateChannelOp => OperationKey::Channel(ChannelOp::CreateChannel),
    "Create a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, MEMBERS],
    |client, params| {
        let members = params.list("members")?;
        let mut data = Map::new();
        if !members.is_empty() {
            data.insert("members".to_string(), json!(members));
        }
        let channel = params.channel()?;
        Ok(client.execute(ServiceCall::CreateChannel { channel, data }).await?)
    }
}

operation_handler! {
    UpdateChannelOp => OperationKey::Channel(ChannelOp::UpdateChannel),
    "Update a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, CHANNEL_DATA],
    |client, params| {
        let call = ServiceCall::UpdateChannel {
            channel: params.channel()?,
            data: params.document("channelData")?.clone(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    DeleteChannelOp => OperationKey::Channel(ChannelOp::DeleteChannel),
    "Delete a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, HARD_DELETE],
    |client, params| {
        let call = ServiceCall::DeleteChannel {
            channel: params.channel()?,
            options: json!({ "hard_delete": params.boolean("hardDelete")? }),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    TruncateOp => OperationKey::Channel(ChannelOp::Truncate),
    "Remove all messages from channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, TRUNCATE_OPTIONS],
    |client, params| {
        let call = ServiceCall::TruncateChannel {
            channel: params.channel()?,
            options: params.document("truncateOptions")?.clone(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    WatchOp => OperationKey::Channel(ChannelOp::Watch),
    "Watch channel for changes",
    params: [CHANNEL_TYPE, CHANNEL_ID],
    |client, params| {
        let channel = params.channel()?;
        Ok(client.execute(ServiceCall::WatchChannel { channel }).await?)
    }
}

operation_handler! {
    StopWatchingOp => OperationKey::Channel(ChannelOp::StopWatching),
    "Stop watching channel",
    params: [CHANNEL_TYPE, CHANNEL_ID],
    |client, params| {
        let channel = params.channel()?;
        Ok(client.execute(ServiceCall::StopWatching { channel }).await?)
    }
}

// ============================================================================
// Membership
// ============================================================================

operation_handler! {
    AddMembersOp => OperationKey::Channel(ChannelOp::AddMembers),
    "Add members to a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, MEMBERS],
    |client, params| {
        let call = ServiceCall::AddMembers {
            channel: params.channel()?,
            members: params.list("members")?.to_vec(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    RemoveMembersOp => OperationKey::Channel(ChannelOp::RemoveMembers),
    "Remove members from a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, MEMBERS],
    |client, params| {
        let call = ServiceCall::RemoveMembers {
            channel: params.channel()?,
            members: params.list("members")?.to_vec(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    AddModeratorsOp => OperationKey::Channel(ChannelOp::AddModerators),
    "Add moderators to a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, MEMBERS],
    |client, params| {
        let call = ServiceCall::AddModerators {
            channel: params.channel()?,
            members: params.list("members")?.to_vec(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    DemoteModeratorsOp => OperationKey::Channel(ChannelOp::DemoteModerators),
    "Demote moderators",
    params: [CHANNEL_TYPE, CHANNEL_ID, MEMBERS],
    |client, params| {
        let call = ServiceCall::DemoteModerators {
            channel: params.channel()?,
            members: params.list("members")?.to_vec(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    InviteMembersOp => OperationKey::Channel(ChannelOp::InviteMembers),
    "Invite members to channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, MEMBERS],
    |client, params| {
        let call = ServiceCall::InviteMembers {
            channel: params.channel()?,
            members: params.list("members")?.to_vec(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    AcceptInviteOp => OperationKey::Channel(ChannelOp::AcceptInvite),
    "Accept channel invitation",
    params: [CHANNEL_TYPE, CHANNEL_ID],
    |client, params| {
        let channel = params.channel()?;
        Ok(client.execute(ServiceCall::AcceptInvite { channel }).await?)
    }
}

operation_handler! {
    RejectInviteOp => OperationKey::Channel(ChannelOp::RejectInvite),
    "Reject channel invitation",
    params: [CHANNEL_TYPE, CHANNEL_ID],
    |client, params| {
        let channel = params.channel()?;
        Ok(client.execute(ServiceCall::RejectInvite { channel }).await?)
    }
}

// ============================================================================
// Queries
// ============================================================================

operation_handler! {
    QueryChannelsOp => OperationKey::Channel(ChannelOp::QueryChannels),
    "Query channels with filters",
    params: [QUERY_FILTER, QUERY_SORT, LIMIT],
    |client, params| {
        let call = ServiceCall::QueryChannels {
            filter: params.document("queryFilter")?.clone(),
            sort: params.document("querySort")?.clone(),
            options: limit_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    QueryMembersOp => OperationKey::Channel(ChannelOp::QueryMembers),
    "Query channel members",
    params: [CHANNEL_TYPE, CHANNEL_ID, QUERY_FILTER, QUERY_SORT, LIMIT],
    |client, params| {
        let call = ServiceCall::QueryMembers {
            channel: params.channel()?,
            filter: params.document("queryFilter")?.clone(),
            sort: params.document("querySort")?.clone(),
            options: limit_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

// ============================================================================
// Per-user visibility
// ============================================================================

operation_handler! {
    /// An empty `userId` hides the channel for the server-side user.
    HideOp => OperationKey::Channel(ChannelOp::Hide),
    "Hide channel from queries",
    params: [CHANNEL_TYPE, CHANNEL_ID, OPTIONAL_USER_ID, CLEAR_HISTORY],
    |client, params| {
        let call = ServiceCall::HideChannel {
            channel: params.channel()?,
            user_id: params.non_empty_text("userId")?.map(String::from),
            clear_history: params.boolean("clearHistory")?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    ShowOp => OperationKey::Channel(ChannelOp::Show),
    "Show hidden channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, OPTIONAL_USER_ID],
    |client, params| {
        let call = ServiceCall::ShowChannel {
            channel: params.channel()?,
            user_id: params.non_empty_text("userId")?.map(String::from),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    ArchiveOp => OperationKey::Channel(ChannelOp::Archive),
    "Archive a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, OPTIONAL_USER_ID],
    |client, params| {
        let call = ServiceCall::ArchiveChannel {
            channel: params.channel()?,
            options: user_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UnarchiveOp => OperationKey::Channel(ChannelOp::Unarchive),
    "Unarchive a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, OPTIONAL_USER_ID],
    |client, params| {
        let call = ServiceCall::UnarchiveChannel {
            channel: params.channel()?,
            options: user_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    PinOp => OperationKey::Channel(ChannelOp::Pin),
    "Pin channel for user",
    params: [CHANNEL_TYPE, CHANNEL_ID, OPTIONAL_USER_ID],
    |client, params| {
        let call = ServiceCall::PinChannel {
            channel: params.channel()?,
            options: user_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UnpinOp => OperationKey::Channel(ChannelOp::Unpin),
    "Unpin channel for user",
    params: [CHANNEL_TYPE, CHANNEL_ID, OPTIONAL_USER_ID],
    |client, params| {
        let call = ServiceCall::UnpinChannel {
            channel: params.channel()?,
            options: user_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

// ============================================================================
// Mute and read state
// ============================================================================

operation_handler! {
    MuteOp => OperationKey::Channel(ChannelOp::Mute),
    "Mute a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, OPTIONAL_USER_ID, MUTE_EXPIRATION],
    |client, params| {
        let call = ServiceCall::MuteChannel {
            channel: params.channel()?,
            options: json!({
                "user_id": params.text("userId")?,
                "expiration": params.integer("muteExpiration")?,
            }),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UnmuteOp => OperationKey::Channel(ChannelOp::Unmute),
    "Unmute a channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, OPTIONAL_USER_ID],
    |client, params| {
        let call = ServiceCall::UnmuteChannel {
            channel: params.channel()?,
            options: user_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    /// Answered from client state, no network call.
    MuteStatusOp => OperationKey::Channel(ChannelOp::MuteStatus),
    "Get channel mute status",
    params: [CHANNEL_TYPE, CHANNEL_ID],
    |client, params| {
        Ok(client.mute_status(&params.channel()?)?)
    }
}

operation_handler! {
    MarkReadOp => OperationKey::Channel(ChannelOp::MarkRead),
    "Mark channel as read",
    params: [CHANNEL_TYPE, CHANNEL_ID],
    |client, params| {
        let channel = params.channel()?;
        Ok(client.execute(ServiceCall::MarkRead { channel }).await?)
    }
}

operation_handler! {
    MarkUnreadOp => OperationKey::Channel(ChannelOp::MarkUnread),
    "Mark channel as unread",
    params: [CHANNEL_TYPE, CHANNEL_ID, MESSAGE_ID_UNREAD],
    |client, params| {
        let call = ServiceCall::MarkUnread {
            channel: params.channel()?,
            options: json!({ "message_id": params.text("messageIdUnread")? }),
        };
        Ok(client.execute(call).await?)
    }
}

// ============================================================================
// Attachments
// ============================================================================

operation_handler! {
    SendFileOp => OperationKey::Channel(ChannelOp::SendFile),
    "Upload and send file",
    params: [CHANNEL_TYPE, CHANNEL_ID, FILE_PATH, FILE_NAME],
    |client, params| {
        let call = ServiceCall::SendFile {
            channel: params.channel()?,
            path: params.text("filePath")?.to_string(),
            name: params.text("fileName")?.to_string(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    SendImageOp => OperationKey::Channel(ChannelOp::SendImage),
    "Upload and send image",
    params: [CHANNEL_TYPE, CHANNEL_ID, FILE_PATH, FILE_NAME],
    |client, params| {
        let call = ServiceCall::SendImage {
            channel: params.channel()?,
            path: params.text("filePath")?.to_string(),
            name: params.text("fileName")?.to_string(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    DeleteFileOp => OperationKey::Channel(ChannelOp::DeleteFile),
    "Delete uploaded file",
    params: [CHANNEL_TYPE, CHANNEL_ID, FILE_URL],
    |client, params| {
        let call = ServiceCall::DeleteFile {
            channel: params.channel()?,
            url: params.text("fileUrl")?.to_string(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    DeleteImageOp => OperationKey::Channel(ChannelOp::DeleteImage),
    "Delete uploaded image",
    params: [CHANNEL_TYPE, CHANNEL_ID, FILE_URL],
    |client, params| {
        let call = ServiceCall::DeleteImage {
            channel: params.channel()?,
            url: params.text("fileUrl")?.to_string(),
        };
        Ok(client.execute(call).await?)
    }
}

// ============================================================================
// Channel-scoped moderation and config
// ============================================================================

operation_handler! {
    BanChannelUserOp => OperationKey::Channel(ChannelOp::BanUser),
    "Ban user from channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, TARGET_USER_ID, BAN_REASON, BAN_TIMEOUT],
    |client, params| {
        let call = ServiceCall::BanChannelMember {
            channel: params.channel()?,
            target_user_id: params.text("targetUserId")?.to_string(),
            options: json!({
                "reason": params.text("banReason")?,
                "timeout": params.integer("banTimeout")?,
            }),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UnbanChannelUserOp => OperationKey::Channel(ChannelOp::UnbanUser),
    "Unban user from channel",
    params: [CHANNEL_TYPE, CHANNEL_ID, TARGET_USER_ID],
    |client, params| {
        let call = ServiceCall::UnbanChannelMember {
            channel: params.channel()?,
            target_user_id: params.text("targetUserId")?.to_string(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    EnableSlowModeOp => OperationKey::Channel(ChannelOp::EnableSlowMode),
    "Enable slow mode",
    params: [CHANNEL_TYPE, CHANNEL_ID, COOLDOWN_INTERVAL],
    |client, params| {
        let call = ServiceCall::EnableSlowMode {
            channel: params.channel()?,
            cooldown_seconds: params.integer("cooldownInterval")?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    DisableSlowModeOp => OperationKey::Channel(ChannelOp::DisableSlowMode),
    "Disable slow mode",
    params: [CHANNEL_TYPE, CHANNEL_ID],
    |client, params| {
        let channel = params.channel()?;
        Ok(client.execute(ServiceCall::DisableSlowMode { channel }).await?)
    }
}

operation_handler! {
    SendActionOp => OperationKey::Channel(ChannelOp::SendAction),
    "Send message action",
    params: [CHANNEL_TYPE, CHANNEL_ID, MESSAGE_ID, FORM_DATA],
    |client, params| {
        let call = ServiceCall::SendAction {
            channel: params.channel()?,
            message_id: params.text("messageId")?.to_string(),
            form_data: params.document("formData")?.clone(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    /// Answered from client state, no network call.
    GetConfigOp => OperationKey::Channel(ChannelOp::GetConfig),
    "Get channel configuration",
    params: [CHANNEL_TYPE, CHANNEL_ID],
    |client, params| {
        let config: Value = client.channel_config(&params.channel()?)?;
        Ok(config)
    }
}
