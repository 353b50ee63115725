//! User operations

use std::sync::Arc;

use serde_json::json;

use super::{limit_options, operation_handler, with_id, LIMIT, QUERY_FILTER, USER_ID};
use crate::client::ServiceCall;
use crate::operation::{OperationKey, UserOp};
use crate::params::{ParamKind, ParamSpec};
use crate::registry::OperationHandler;

const USER_DATA: ParamSpec = ParamSpec::optional("userData", ParamKind::JsonDocument);
const USERS_DATA: ParamSpec = ParamSpec::optional("usersData", ParamKind::JsonList);

pub(super) fn handler(op: UserOp) -> Arc<dyn OperationHandler> {
    match op {
        UserOp::GenerateToken => Arc::new(GenerateTokenOp),
        UserOp::UpsertUser => Arc::new(UpsertUserOp),
        UserOp::UpsertUsers => Arc::new(UpsertUsersOp),
        UserOp::QueryUsers => Arc::new(QueryUsersOp),
        UserOp::DeactivateUser => Arc::new(DeactivateUserOp),
    }
}

operation_handler! {
    /// Token signing is local to the client; no network round trip.
    GenerateTokenOp => OperationKey::User(UserOp::GenerateToken),
    "Generate a user token",
    params: [USER_ID],
    |client, params| {
        let token = client.create_token(params.text("userId")?)?;
        Ok(json!({ "token": token }))
    }
}

operation_handler! {
    UpsertUserOp => OperationKey::User(UserOp::UpsertUser),
    "Create or update a user",
    params: [USER_ID, USER_DATA],
    |client, params| {
        let user = with_id(params.text("userId")?, params.object("userData")?);
        Ok(client.execute(ServiceCall::UpsertUser { user }).await?)
    }
}

operation_handler! {
    UpsertUsersOp => OperationKey::User(UserOp::UpsertUsers),
    "Create or update multiple users",
    params: [USERS_DATA],
    |client, params| {
        let users = params.document("usersData")?.clone();
        Ok(client.execute(ServiceCall::UpsertUsers { users }).await?)
    }
}

operation_handler! {
    QueryUsersOp => OperationKey::User(UserOp::QueryUsers),
    "Query users",
    params: [QUERY_FILTER, LIMIT],
    |client, params| {
        let call = ServiceCall::QueryUsers {
            filter: params.document("queryFilter")?.clone(),
            sort: json!({}),
            options: limit_options(params)?,
        };
        Ok(client.execute(call).await?)
    }
}

operation_handler! {
    DeactivateUserOp => OperationKey::User(UserOp::DeactivateUser),
    "Deactivate a user",
    params: [USER_ID],
    |client, params| {
        let user_id = params.text("userId")?.to_string();
        Ok(client.execute(ServiceCall::DeactivateUser { user_id }).await?)
    }
}
