//! Request shaping per operation
//!
//! Each test dispatches a single item and inspects the call the dry-run
//! client received.

use serde_json::{json, Map, Value};

use chat_dispatch::{
    operation_registry, BatchExecutor, ChannelRef, DispatchError, DryRunClient, ExecutionConfig,
    ExecutionError, JsonItems, OperationKey, ParameterError, RecordedCall, ServiceCall,
};

async fn dispatch(item: Value) -> (Result<Value, ExecutionError>, Vec<RecordedCall>) {
    let map = item.as_object().cloned().expect("item must be an object");
    let source = JsonItems::new(vec![map]);
    let client = DryRunClient::new();
    let executor = BatchExecutor::new(operation_registry(), ExecutionConfig::default());
    let result = executor
        .execute(&client, &source)
        .await
        .map(|output| output.records()[0].data().cloned().unwrap_or(Value::Null));
    (result, client.calls())
}

async fn remote_call(item: Value) -> ServiceCall {
    let (result, calls) = dispatch(item).await;
    result.expect("item should succeed");
    match calls.as_slice() {
        [RecordedCall::Remote(call)] => call.clone(),
        other => panic!("expected exactly one remote call, got {other:?}"),
    }
}

fn general() -> ChannelRef {
    ChannelRef::new("messaging", "general")
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn test_every_pair_has_exactly_one_distinct_handler() {
    let registry = operation_registry();
    let keys = OperationKey::all();
    assert_eq!(keys.len(), 60);
    assert_eq!(registry.len(), keys.len());

    let mut seen = std::collections::HashSet::new();
    for key in keys {
        let handler = registry
            .lookup(key.resource().as_str(), key.operation())
            .unwrap();
        assert_eq!(handler.key(), key);
        assert!(seen.insert(handler.key()), "{key} registered twice");
    }
}

#[test]
fn test_same_operation_name_routes_by_resource() {
    let registry = operation_registry();
    let channel = registry.lookup("channel", "banUser").unwrap();
    let global = registry.lookup("moderation", "banUser").unwrap();
    assert_ne!(channel.key(), global.key());
    assert!(channel.params().iter().any(|p| p.name == "channelId"));
    assert!(!global.params().iter().any(|p| p.name == "channelId"));
}

#[test]
fn test_unknown_resource_is_unsupported() {
    let err = operation_registry().lookup("webhook", "create").err().unwrap();
    assert_eq!(err.to_string(), "Unsupported operation: webhook.create");
}

// ============================================================================
// Channel
// ============================================================================

#[tokio::test]
async fn test_create_channel_omits_empty_members() {
    let call = remote_call(json!({
        "resource": "channel", "operation": "createChannel",
        "channelId": "general", "members": " , ,",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::CreateChannel {
            channel: general(),
            data: Map::new(),
        }
    );
}

#[tokio::test]
async fn test_create_channel_normalizes_members() {
    let call = remote_call(json!({
        "resource": "channel", "operation": "createChannel",
        "channelType": "team", "channelId": "eng", "members": " a , b ,, c ",
    }))
    .await;
    let ServiceCall::CreateChannel { channel, data } = call else {
        panic!("wrong call");
    };
    assert_eq!(channel, ChannelRef::new("team", "eng"));
    assert_eq!(Value::Object(data), json!({"members": ["a", "b", "c"]}));
}

#[tokio::test]
async fn test_add_members_passes_list() {
    let call = remote_call(json!({
        "resource": "channel", "operation": "addMembers",
        "channelId": "general", "members": "u1,u2",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::AddMembers {
            channel: general(),
            members: vec!["u1".into(), "u2".into()],
        }
    );
}

#[tokio::test]
async fn test_delete_channel_hard_delete_flag() {
    let call = remote_call(json!({
        "resource": "channel", "operation": "deleteChannel",
        "channelId": "general", "hardDelete": true,
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::DeleteChannel {
            channel: general(),
            options: json!({"hard_delete": true}),
        }
    );
}

#[tokio::test]
async fn test_query_channels_defaults() {
    let call = remote_call(json!({"resource": "channel", "operation": "queryChannels"})).await;
    assert_eq!(
        call,
        ServiceCall::QueryChannels {
            filter: json!({}),
            sort: json!({}),
            options: json!({"limit": 50}),
        }
    );
}

#[tokio::test]
async fn test_hide_without_user() {
    let call = remote_call(json!({
        "resource": "channel", "operation": "hide",
        "channelId": "general", "userId": "",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::HideChannel {
            channel: general(),
            user_id: None,
            clear_history: false,
        }
    );
}

#[tokio::test]
async fn test_mute_channel_default_expiration() {
    let call = remote_call(json!({
        "resource": "channel", "operation": "mute",
        "channelId": "general", "userId": "u1",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::MuteChannel {
            channel: general(),
            options: json!({"user_id": "u1", "expiration": 60}),
        }
    );
}

#[tokio::test]
async fn test_channel_ban_defaults() {
    let call = remote_call(json!({
        "resource": "channel", "operation": "banUser",
        "channelId": "general", "targetUserId": "troll",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::BanChannelMember {
            channel: general(),
            target_user_id: "troll".into(),
            options: json!({"reason": "", "timeout": 60}),
        }
    );
}

#[tokio::test]
async fn test_slow_mode_default_cooldown() {
    let call = remote_call(json!({
        "resource": "channel", "operation": "enableSlowMode", "channelId": "general",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::EnableSlowMode {
            channel: general(),
            cooldown_seconds: 5,
        }
    );
}

#[tokio::test]
async fn test_mute_status_is_local() {
    let (result, calls) = dispatch(json!({
        "resource": "channel", "operation": "muteStatus", "channelId": "general",
    }))
    .await;
    assert_eq!(result.unwrap()["muted"], json!(false));
    assert_eq!(calls, vec![RecordedCall::MuteStatus { channel: general() }]);
}

#[tokio::test]
async fn test_missing_channel_id() {
    let (result, calls) = dispatch(json!({"resource": "channel", "operation": "watch"})).await;
    let err = result.unwrap_err();
    assert!(matches!(
        err.source,
        DispatchError::Parameter(ParameterError::Missing { ref name }) if name == "channelId"
    ));
    assert!(calls.is_empty());
}

// ============================================================================
// User and message
// ============================================================================

#[tokio::test]
async fn test_upsert_user_merges_payload() {
    let call = remote_call(json!({
        "resource": "user", "operation": "upsertUser",
        "userId": "u1", "userData": "{\"name\": \"Ada\", \"role\": \"admin\"}",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::UpsertUser {
            user: json!({"id": "u1", "name": "Ada", "role": "admin"}),
        }
    );
}

#[tokio::test]
async fn test_upsert_user_rejects_non_object() {
    let (result, _) = dispatch(json!({
        "resource": "user", "operation": "upsertUser",
        "userId": "u1", "userData": "[1, 2]",
    }))
    .await;
    assert!(matches!(
        result.unwrap_err().source,
        DispatchError::Parameter(ParameterError::NotAnObject { .. })
    ));
}

#[tokio::test]
async fn test_upsert_users_empty_list() {
    let call = remote_call(json!({
        "resource": "user", "operation": "upsertUsers", "usersData": "",
    }))
    .await;
    assert_eq!(call, ServiceCall::UpsertUsers { users: json!([]) });
}

#[tokio::test]
async fn test_query_users_custom_limit() {
    let call = remote_call(json!({
        "resource": "user", "operation": "queryUsers",
        "queryFilter": "{\"role\": \"admin\"}", "limit": 10,
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::QueryUsers {
            filter: json!({"role": "admin"}),
            sort: json!({}),
            options: json!({"limit": 10}),
        }
    );
}

#[tokio::test]
async fn test_send_message_cid_first_colon_only() {
    let call = remote_call(json!({
        "resource": "message", "operation": "sendMessage",
        "channelCid": "team:a:b", "text": "hi", "senderId": "u2",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::SendMessage {
            channel: ChannelRef::new("team", "a:b"),
            message: json!({"text": "hi", "user_id": "u2"}),
        }
    );
}

#[tokio::test]
async fn test_send_message_cid_without_colon() {
    let (result, calls) = dispatch(json!({
        "resource": "message", "operation": "sendMessage",
        "channelCid": "general", "text": "hi", "senderId": "u2",
    }))
    .await;
    assert!(matches!(
        result.unwrap_err().source,
        DispatchError::Parameter(ParameterError::InvalidChannelCid { .. })
    ));
    assert!(calls.is_empty());
}

#[tokio::test]
async fn test_search_messages_filter() {
    let call = remote_call(json!({
        "resource": "message", "operation": "searchMessages",
        "channelCid": "messaging:general", "searchQuery": "hello",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::SearchMessages {
            filter: json!({"type": "messaging", "cid": "messaging:general"}),
            query: "hello".into(),
        }
    );
}

// ============================================================================
// Moderation
// ============================================================================

#[tokio::test]
async fn test_ban_without_optional_fields() {
    let call = remote_call(json!({
        "resource": "moderation", "operation": "banUser",
        "targetUserId": "troll", "reason": "spam", "timeout": 120,
        "ipAddress": "", "userAgent": "",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::BanUser {
            target_user_id: "troll".into(),
            options: json!({"reason": "spam", "timeout": 120}),
        }
    );
}

/// Suspicious edge case: the address only toggles `ip_ban`; the value is
/// dropped before it reaches the client.
#[tokio::test]
async fn test_shadow_ban_ip_address_is_reduced_to_flag() {
    let call = remote_call(json!({
        "resource": "moderation", "operation": "shadowBan",
        "targetUserId": "troll", "ipAddress": "192.0.2.7", "userAgent": "bot/1.0",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::ShadowBan {
            target_user_id: "troll".into(),
            options: json!({
                "reason": "",
                "timeout": 60,
                "ip_ban": true,
                "user_agent": "bot/1.0",
            }),
        }
    );
}

#[tokio::test]
async fn test_query_banned_users_shape() {
    let call = remote_call(json!({
        "resource": "moderation", "operation": "queryBannedUsers",
        "filterQuery": "{\"channel_cid\": \"messaging:general\"}",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::QueryBannedUsers {
            filter: json!({"channel_cid": "messaging:general"}),
            sort: json!({}),
            options: json!({"limit": 50}),
        }
    );
}

#[tokio::test]
async fn test_review_flag_default_action() {
    let call = remote_call(json!({
        "resource": "moderation", "operation": "reviewFlag", "flagId": "f1",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::ReviewFlag {
            flag_id: "f1".into(),
            action: "reviewed".into(),
        }
    );
}

#[tokio::test]
async fn test_flag_message_reason() {
    let call = remote_call(json!({
        "resource": "moderation", "operation": "flagMessage",
        "messageId": "m1", "reason": "abuse",
    }))
    .await;
    assert_eq!(
        call,
        ServiceCall::FlagMessage {
            message_id: "m1".into(),
            options: json!({"reason": "abuse"}),
        }
    );
}
