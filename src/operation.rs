//! Operation keys
//!
//! Every command is addressed by a `(resource, operation)` pair. Both halves
//! are closed enums so that adding an operation without a handler is a
//! compile error in `handlers::handler_for`.

use std::fmt;

use serde::Serialize;

use crate::error::DispatchError;

/// Declares an operation enum together with its wire names.
macro_rules! operation_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Host-facing operation name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

/// Top-level entity category of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    User,
    Channel,
    Message,
    Moderation,
}

impl Resource {
    pub const ALL: &'static [Resource] = &[
        Resource::User,
        Resource::Channel,
        Resource::Message,
        Resource::Moderation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Channel => "channel",
            Resource::Message => "message",
            Resource::Moderation => "moderation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Resource::User),
            "channel" => Some(Resource::Channel),
            "message" => Some(Resource::Message),
            "moderation" => Some(Resource::Moderation),
            _ => None,
        }
    }
}

operation_enum! {
    UserOp {
        GenerateToken => "generateToken",
        UpsertUser => "upsertUser",
        UpsertUsers => "upsertUsers",
        QueryUsers => "queryUsers",
        DeactivateUser => "deactivateUser",
    }
}

operation_enum! {
    ChannelOp {
        CreateChannel => "createChannel",
        UpdateChannel => "updateChannel",
        DeleteChannel => "deleteChannel",
        Truncate => "truncate",
        Watch => "watch",
        StopWatching => "stopWatching",
        AddMembers => "addMembers",
        RemoveMembers => "removeMembers",
        AddModerators => "addModerators",
        DemoteModerators => "demoteModerators",
        InviteMembers => "inviteMembers",
        AcceptInvite => "acceptInvite",
        RejectInvite => "rejectInvite",
        QueryChannels => "queryChannels",
        QueryMembers => "queryMembers",
        Hide => "hide",
        Show => "show",
        Archive => "archive",
        Unarchive => "unarchive",
        Pin => "pin",
        Unpin => "unpin",
        Mute => "mute",
        Unmute => "unmute",
        MuteStatus => "muteStatus",
        MarkRead => "markRead",
        MarkUnread => "markUnread",
        SendFile => "sendFile",
        SendImage => "sendImage",
        DeleteFile => "deleteFile",
        DeleteImage => "deleteImage",
        BanUser => "banUser",
        UnbanUser => "unbanUser",
        EnableSlowMode => "enableSlowMode",
        DisableSlowMode => "disableSlowMode",
        SendAction => "sendAction",
        GetConfig => "getConfig",
    }
}

operation_enum! {
    MessageOp {
        SendMessage => "sendMessage",
        UpdateMessage => "updateMessage",
        DeleteMessage => "deleteMessage",
        SearchMessages => "searchMessages",
    }
}

operation_enum! {
    ModerationOp {
        BanUser => "banUser",
        UnbanUser => "unbanUser",
        ShadowBan => "shadowBan",
        RemoveShadowBan => "removeShadowBan",
        MuteUser => "muteUser",
        UnmuteUser => "unmuteUser",
        FlagUser => "flagUser",
        UnflagUser => "unflagUser",
        FlagMessage => "flagMessage",
        UnflagMessage => "unflagMessage",
        QueryBannedUsers => "queryBannedUsers",
        QueryFlags => "queryFlags",
        QueryMessageFlags => "queryMessageFlags",
        ReviewFlag => "reviewFlag",
        CheckAutomod => "checkAutomod",
    }
}

/// A `(resource, operation)` pair with the operation scoped to its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKey {
    User(UserOp),
    Channel(ChannelOp),
    Message(MessageOp),
    Moderation(ModerationOp),
}

impl OperationKey {
    /// Parse host-supplied resource and operation names.
    pub fn parse(resource: &str, operation: &str) -> Result<Self, DispatchError> {
        let unsupported = || DispatchError::unsupported(resource, operation);
        let key = match Resource::parse(resource).ok_or_else(unsupported)? {
            Resource::User => UserOp::parse(operation).map(OperationKey::User),
            Resource::Channel => ChannelOp::parse(operation).map(OperationKey::Channel),
            Resource::Message => MessageOp::parse(operation).map(OperationKey::Message),
            Resource::Moderation => ModerationOp::parse(operation).map(OperationKey::Moderation),
        };
        key.ok_or_else(unsupported)
    }

    pub fn resource(&self) -> Resource {
        match self {
            OperationKey::User(_) => Resource::User,
            OperationKey::Channel(_) => Resource::Channel,
            OperationKey::Message(_) => Resource::Message,
            OperationKey::Moderation(_) => Resource::Moderation,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            OperationKey::User(op) => op.as_str(),
            OperationKey::Channel(op) => op.as_str(),
            OperationKey::Message(op) => op.as_str(),
            OperationKey::Moderation(op) => op.as_str(),
        }
    }

    /// Every declared pair, grouped by resource
    pub fn all() -> Vec<OperationKey> {
        let users = UserOp::ALL.iter().copied().map(OperationKey::User);
        let channels = ChannelOp::ALL.iter().copied().map(OperationKey::Channel);
        let messages = MessageOp::ALL.iter().copied().map(OperationKey::Message);
        let moderation = ModerationOp::ALL.iter().copied().map(OperationKey::Moderation);
        users
            .chain(channels)
            .chain(messages)
            .chain(moderation)
            .collect()
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource().as_str(), self.operation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_size() {
        assert_eq!(UserOp::ALL.len(), 5);
        assert_eq!(ChannelOp::ALL.len(), 36);
        assert_eq!(MessageOp::ALL.len(), 4);
        assert_eq!(ModerationOp::ALL.len(), 15);
        assert_eq!(OperationKey::all().len(), 60);
    }

    #[test]
    fn test_parse_round_trips_every_key() {
        for key in OperationKey::all() {
            let parsed = OperationKey::parse(key.resource().as_str(), key.operation()).unwrap();
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_same_operation_name_differs_by_resource() {
        let channel = OperationKey::parse("channel", "banUser").unwrap();
        let moderation = OperationKey::parse("moderation", "banUser").unwrap();
        assert_ne!(channel, moderation);
        assert_eq!(channel.to_string(), "channel.banUser");
        assert_eq!(moderation.to_string(), "moderation.banUser");
    }

    #[test]
    fn test_unknown_pairs_are_unsupported() {
        for (resource, operation) in [
            ("channel", "doesNotExist"),
            ("team", "createChannel"),
            ("user", "createChannel"),
            ("", ""),
        ] {
            let err = OperationKey::parse(resource, operation).unwrap_err();
            assert!(matches!(err, DispatchError::UnsupportedOperation { .. }));
        }
    }

    #[test]
    fn test_keys_are_distinct() {
        let keys: HashSet<_> = OperationKey::all().into_iter().collect();
        assert_eq!(keys.len(), 60);
        for resource in Resource::ALL {
            assert_eq!(Resource::parse(resource.as_str()), Some(*resource));
        }
    }
}
