//! Moderation operations
//!
//! Global moderation, not scoped to a channel. Channel-scoped bans live in
//! `channel`.

use std::sync::Arc;

use serde_json::{json, Value};

use super::{
    limit_options, operation_handler, CHANNEL_CID, FILTER_QUERY, LIMIT, MESSAGE_ID, REASON,
    TARGET_USER_ID, TIMEOUT,
};
use crate::client::ServiceCall;
use crate::error::ParameterError;
use crate::operation::{ModerationOp, OperationKey};
use crate::params::{ParamKind, ParamSpec, ResolvedParams};
use crate::registry::OperationHandler;

const IP_ADDRESS: ParamSpec = ParamSpec::optional("ipAddress", ParamKind::Text);
const USER_AGENT: ParamSpec = ParamSpec::optional("userAgent", ParamKind::Text);
const FLAG_ID: ParamSpec = ParamSpec::required("flagId", ParamKind::Text);
const REVIEW_ACTION: ParamSpec =
    ParamSpec::optional("reviewAction", ParamKind::Text).or_text("reviewed");
const MESSAGE_TEXT: ParamSpec = ParamSpec::required("messageText", ParamKind::Text);

const AUTOMOD_NOTICE: &str =
    "Automod check completed - configure Stream Chat automod rules for actual filtering";

pub(super) fn handler(op: ModerationOp) -> Arc<dyn OperationHandler> {
    match op {
        ModerationOp::BanUser => Arc::new(BanUserOp),
        ModerationOp::UnbanUser => Arc::new(UnbanUserOp),
        ModerationOp::ShadowBan => Arc::new(ShadowBanOp),
        ModerationOp::RemoveShadowBan => Arc::new(RemoveShadowBanOp),
        ModerationOp::MuteUser => Arc::new(MuteUserOp),
        ModerationOp::UnmuteUser => Arc::new(UnmuteUserOp),
        ModerationOp::FlagUser => Arc::new(FlagUserOp),
        ModerationOp::UnflagUser => Arc::new(UnflagUserOp),
        ModerationOp::FlagMessage => Arc::new(FlagMessageOp),
        ModerationOp::UnflagMessage => Arc::new(UnflagMessageOp),
        ModerationOp::QueryBannedUsers => Arc::new(QueryBannedUsersOp),
        ModerationOp::QueryFlags => Arc::new(QueryFlagsOp),
        ModerationOp::QueryMessageFlags => Arc::new(QueryMessageFlagsOp),
        ModerationOp::ReviewFlag => Arc::new(ReviewFlagOp),
        ModerationOp::CheckAutomod => Arc::new(CheckAutomodOp),
    }
}

/// `{reason, timeout}`
fn reason_timeout(params: &ResolvedParams) -> Result<Value, ParameterError> {
    Ok(json!({
        "reason": params.text("reason")?,
        "timeout": params.integer("timeout")?,
    }))
}

/// Ban options. `ip_ban` is a flag: the address itself is not forwarded.
fn ban_options(params: &ResolvedParams) -> Result<Value, ParameterError> {
    let mut options = reason_timeout(params)?;
    if let Some(map) = options.as_object_mut() {
        if params.non_empty_text("ipAddress")?.is_some() {
            map.insert("ip_ban".to_string(), Value::Bool(true));
        }
        if let Some(agent) = params.non_empty_text("userAgent")? {
            map.insert("user_agent".to_string(), Value::String(agent.to_string()));
        }
    }
    Ok(options)
}

fn target_user_id(params: &ResolvedParams) -> Result<String, ParameterError> {
    Ok(params.text("targetUserId")?.to_string())
}

// ============================================================================
// Bans
// ============================================================================

operation_handler! {
    BanUserOp => OperationKey::Moderation(ModerationOp::BanUser),
    "Ban user globally",
    params: [TARGET_USER_ID, REASON, TIMEOUT, IP_ADDRESS, USER_AGENT],
    |client, params| {
        let call = ServiceCall::BanUser {
            target_user_id: target_user_id(params)?,
            options: ban_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UnbanUserOp => OperationKey::Moderation(ModerationOp::UnbanUser),
    "Unban user globally",
    params: [TARGET_USER_ID],
    |client, params| {
        let target_user_id = target_user_id(params)?;
        Ok(client.execute(ServiceCall::UnbanUser { target_user_id }).await?)
    }
}

operation_handler! {
    ShadowBanOp => OperationKey::Moderation(ModerationOp::ShadowBan),
    "Shadow ban user",
    params: [TARGET_USER_ID, REASON, TIMEOUT, IP_ADDRESS, USER_AGENT],
    |client, params| {
        let call = ServiceCall::ShadowBan {
            target_user_id: target_user_id(params)?,
            options: ban_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    RemoveShadowBanOp => OperationKey::Moderation(ModerationOp::RemoveShadowBan),
    "Remove shadow ban",
    params: [TARGET_USER_ID],
    |client, params| {
        let target_user_id = target_user_id(params)?;
        Ok(client.execute(ServiceCall::RemoveShadowBan { target_user_id }).await?)
    }
}

// ============================================================================
// Mutes and flags
// ============================================================================

operation_handler! {
    MuteUserOp => OperationKey::Moderation(ModerationOp::MuteUser),
    "Mute user globally",
    params: [TARGET_USER_ID, REASON, TIMEOUT],
    |client, params| {
        let call = ServiceCall::MuteUser {
            target_user_id: target_user_id(params)?,
            options: reason_timeout(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UnmuteUserOp => OperationKey::Moderation(ModerationOp::UnmuteUser),
    "Unmute user globally",
    params: [TARGET_USER_ID],
    |client, params| {
        let target_user_id = target_user_id(params)?;
        Ok(client.execute(ServiceCall::UnmuteUser { target_user_id }).await?)
    }
}

operation_handler! {
    FlagUserOp => OperationKey::Moderation(ModerationOp::FlagUser),
    "Flag user for review",
    params: [TARGET_USER_ID, REASON],
    |client, params| {
        let call = ServiceCall::FlagUser {
            target_user_id: target_user_id(params)?,
            options: json!({ "reason": params.text("reason")? }),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UnflagUserOp => OperationKey::Moderation(ModerationOp::UnflagUser),
    "Remove user flag",
    params: [TARGET_USER_ID],
    |client, params| {
        let target_user_id = target_user_id(params)?;
        Ok(client.execute(ServiceCall::UnflagUser { target_user_id }).await?)
    }
}

operation_handler! {
    FlagMessageOp => OperationKey::Moderation(ModerationOp::FlagMessage),
    "Flag message for review",
    params: [MESSAGE_ID, REASON],
    |client, params| {
        let call = ServiceCall::FlagMessage {
            message_id: params.text("messageId")?.to_string(),
            options: json!({ "reason": params.text("reason")? }),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UnflagMessageOp => OperationKey::Moderation(ModerationOp::UnflagMessage),
    "Remove message flag",
    params: [MESSAGE_ID],
    |client, params| {
        let message_id = params.text("messageId")?.to_string();
        Ok(client.execute(ServiceCall::UnflagMessage { message_id }).await?)
    }
}

// ============================================================================
// Queries and review
// ============================================================================

operation_handler! {
    QueryBannedUsersOp => OperationKey::Moderation(ModerationOp::QueryBannedUsers),
    "Query banned users",
    params: [FILTER_QUERY, LIMIT],
    |client, params| {
        let call = ServiceCall::QueryBannedUsers {
            filter: params.document("filterQuery")?.clone(),
            sort: json!({}),
            options: limit_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    QueryFlagsOp => OperationKey::Moderation(ModerationOp::QueryFlags),
    "Query flagged content",
    params: [FILTER_QUERY, LIMIT],
    |client, params| {
        let call = ServiceCall::QueryFlags {
            filter: params.document("filterQuery")?.clone(),
            options: limit_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    QueryMessageFlagsOp => OperationKey::Moderation(ModerationOp::QueryMessageFlags),
    "Query flagged messages",
    params: [FILTER_QUERY, LIMIT],
    |client, params| {
        let call = ServiceCall::QueryMessageFlags {
            filter: params.document("filterQuery")?.clone(),
            options: limit_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    ReviewFlagOp => OperationKey::Moderation(ModerationOp::ReviewFlag),
    "Review flagged content",
    params: [FLAG_ID, REVIEW_ACTION],
    |client, params| {
        let call = ServiceCall::ReviewFlag {
            flag_id: params.text("flagId")?.to_string(),
            action: params.text("reviewAction")?.to_string(),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    /// Local placeholder: echoes the input and always passes. The client is
    /// not consulted.
    CheckAutomodOp => OperationKey::Moderation(ModerationOp::CheckAutomod),
    "Check message for automod violations",
    params: [MESSAGE_TEXT, CHANNEL_CID],
    |_client, params| {
        Ok(json!({
            "text": params.text("messageText")?,
            "channel_cid": params.text("channelCid")?,
            "automod_result": "passed",
            "message": AUTOMOD_NOTICE,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{resolve_params, JsonItems};

    fn resolve(item: Value, specs: &[ParamSpec]) -> ResolvedParams {
        let map = item.as_object().cloned().unwrap();
        resolve_params(&JsonItems::new(vec![map]), 0, specs).unwrap()
    }

    const BAN_SPECS: &[ParamSpec] = &[TARGET_USER_ID, REASON, TIMEOUT, IP_ADDRESS, USER_AGENT];

    #[test]
    fn test_ban_options_omit_absent_fields() {
        let params = resolve(json!({"targetUserId": "u1"}), BAN_SPECS);
        assert_eq!(
            ban_options(&params).unwrap(),
            json!({"reason": "", "timeout": 60})
        );
    }

    #[test]
    fn test_ban_options_user_agent_forwarded() {
        let params = resolve(
            json!({"targetUserId": "u1", "reason": "spam", "userAgent": "curl/8"}),
            BAN_SPECS,
        );
        assert_eq!(
            ban_options(&params).unwrap(),
            json!({"reason": "spam", "timeout": 60, "user_agent": "curl/8"})
        );
    }

    /// Suspicious: a supplied IP address only switches on `ip_ban`, the
    /// address value never reaches the client.
    #[test]
    fn test_ban_options_ip_address_becomes_flag_only() {
        let params = resolve(
            json!({"targetUserId": "u1", "ipAddress": "10.0.0.1"}),
            BAN_SPECS,
        );
        let options = ban_options(&params).unwrap();
        assert_eq!(options["ip_ban"], json!(true));
        assert!(!options.to_string().contains("10.0.0.1"));
    }
}
