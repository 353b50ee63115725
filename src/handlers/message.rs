//! Message operations

use std::sync::Arc;

use serde_json::json;

use super::{operation_handler, with_id, CHANNEL_CID, MESSAGE_ID};
use crate::client::ServiceCall;
use crate::operation::{MessageOp, OperationKey};
use crate::params::{ParamKind, ParamSpec};
use crate::registry::OperationHandler;

const TEXT: ParamSpec = ParamSpec::required("text", ParamKind::Text);
const SENDER_ID: ParamSpec = ParamSpec::required("senderId", ParamKind::Text);
const MESSAGE_DATA: ParamSpec = ParamSpec::optional("messageData", ParamKind::JsonDocument);
const SEARCH_QUERY: ParamSpec = ParamSpec::required("searchQuery", ParamKind::Text);

pub(super) fn handler(op: MessageOp) -> Arc<dyn OperationHandler> {
    match op {
        MessageOp::SendMessage => Arc::new(SendMessageOp),
        MessageOp::UpdateMessage => Arc::new(UpdateMessageOp),
        MessageOp::DeleteMessage => Arc::new(DeleteMessageOp),
        MessageOp::SearchMessages => Arc::new(SearchMessagesOp),
    }
}

operation_handler! {
    SendMessageOp => OperationKey::Message(MessageOp::SendMessage),
    "Send a message",
    params: [CHANNEL_CID, TEXT, SENDER_ID],
    |client, params| {
        let call = ServiceCall::SendMessage {
            channel: params.channel_cid("channelCid")?,
            message: json!({
                "text": params.text("text")?,
                "user_id": params.text("senderId")?,
            }),
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    UpdateMessageOp => OperationKey::Message(MessageOp::UpdateMessage),
    "Update a message",
    params: [MESSAGE_ID, MESSAGE_DATA],
    |client, params| {
        let message = with_id(params.text("messageId")?, params.object("messageData")?);
        Ok(client.execute(ServiceCall::UpdateMessage { message }).await?)
    }
}

operation_handler! {
    DeleteMessageOp => OperationKey::Message(MessageOp::DeleteMessage),
    "Delete a message",
    params: [MESSAGE_ID],
    |client, params| {
        let message_id = params.text("messageId")?.to_string();
        Ok(client.execute(ServiceCall::DeleteMessage { message_id }).await?)
    }
}

operation_handler! {
    /// Search is scoped to the channel named by `channelCid`.
    SearchMessagesOp => OperationKey::Message(MessageOp::SearchMessages),
    "Search messages",
    params: [CHANNEL_CID, SEARCH_QUERY],
    |client, params| {
        let channel = params.channel_cid("channelCid")?;
        let call = ServiceCall::SearchMessages {
            filter: json!({ "type": channel.channel_type, "cid": channel.cid() }),
            query: params.text("searchQuery")?.to_string(),
        };
        Ok(client.execute(call).await?)
    }
}
