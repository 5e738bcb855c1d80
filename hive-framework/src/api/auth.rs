//! Auth interceptor
//!
//! Runs before every framework API operation, independent of framework
//! identity. Requires an `X-Auth-Token` header — its absence terminates
//! the request with a client error before any RPC is issued — then
//! validates the token with the manager and attaches the resolved caller
//! to the request for downstream handlers.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use hive_bus::{ReplyError, RpcPublisher, decode_reply};
use hive_core::domain::user::UserInfo;
use hive_core::dto::rpc::{ValidateRequest, ValidateReply};

use crate::api::ApiState;
use crate::api::error::ApiError;

pub async fn auth_middleware(
    State(state): State<ApiState>,
    mut request: Request,
    next: Next,
) -> Response {
    let debug = request.headers().contains_key("X-Debug");
    let permission = state.permissions.get(request.uri().path()).cloned();

    match validate_token(&state, request.headers(), permission).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_envelope(debug),
    }
}

async fn validate_token(
    state: &ApiState,
    headers: &HeaderMap,
    permission: Option<String>,
) -> Result<UserInfo, ApiError> {
    let token = headers
        .get("X-Auth-Token")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing API Token".to_string()))?;

    let publisher = RpcPublisher::new(state.rpc.clone(), "security", "validate");
    let request = ValidateRequest {
        token: token.to_string(),
        permission,
    };

    let correlation_id = publisher
        .publish(&request)
        .await
        .map_err(|err| ApiError::Internal(format!("error publishing auth rpc: {err}")))?;

    let reply = publisher
        .get_data(correlation_id, state.rpc_wait)
        .await
        .ok_or_else(|| {
            ApiError::Internal("did not hear back from a manager - security validate".to_string())
        })?;

    match decode_reply::<ValidateReply>(reply) {
        Ok(body) => Ok(body.user),
        Err(ReplyError::Status { code, message }) => Err(ApiError::Status { code, message }),
        Err(ReplyError::Malformed(err)) => Err(ApiError::Internal(format!(
            "malformed validate reply: {err}"
        ))),
    }
}
