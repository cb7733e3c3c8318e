//! Private messaging endpoints, gated by the directed relation model.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::rest::UserResponse;
use crate::state::GatewayState;
use palaver_database::entities::relation::RelationStatus;
use palaver_database::{PrivateMessage, User};

#[derive(Debug, Serialize, ToSchema)]
pub struct PrivateMessageResponse {
    pub id: i64,
    pub content: String,
    pub created_at: String,
    pub user: Option<UserResponse>,
    pub touser: Option<UserResponse>,
}

impl PrivateMessageResponse {
    fn embed(message: PrivateMessage, users: &[User]) -> Self {
        let lookup = |id: i64| users.iter().find(|u| u.id == id).map(UserResponse::from);
        Self {
            user: lookup(message.user_id),
            touser: lookup(message.to_user_id),
            id: message.id,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub status: i64,
    pub messages: Vec<PrivateMessageResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendPrivateMessageRequest {
    pub to_user: i64,
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRelationRequest {
    pub to_user: i64,
    /// 0 = block, 1 = ignore, 2 = active.
    pub status: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RelationUpdatedResponse {
    pub user: i64,
    pub touser: i64,
    pub status: i64,
}

/// Create private message routes
pub fn create_private_message_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/privateMsg", post(send_private_message))
        .route("/api/privateMsg/relation", put(update_relation))
        .route("/api/privateMsg/:user_id", get(get_conversation))
}

#[utoipa::path(
    get,
    path = "/api/privateMsg/{user_id}",
    tag = "Private messages",
    security(("bearer" = [])),
    params(("user_id" = i64, Path, description = "Conversation partner")),
    responses(
        (status = 200, description = "Conversation, or the silencing status alone", body = ConversationResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_conversation(
    Path(other_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> GatewayResult<Response> {
    let relation = state.relations.find_between(user_id, other_id).await?;

    // A blocked or ignored partner gets the bare status, no history.
    if let Some(status) = relation.as_ref().and_then(|r| r.status()) {
        if status.silences() {
            return Ok(Json(json!({ "status": status.as_i64() })).into_response());
        }
    }

    let messages = state.private_messages.conversation(user_id, other_id).await?;
    let users = state.users.find_all().await?;

    let response = ConversationResponse {
        status: RelationStatus::Active.as_i64(),
        messages: messages
            .into_iter()
            .map(|m| PrivateMessageResponse::embed(m, &users))
            .collect(),
    };

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/privateMsg",
    tag = "Private messages",
    security(("bearer" = [])),
    request_body = SendPrivateMessageRequest,
    responses(
        (status = 201, description = "Stored message", body = PrivateMessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Blocked or ignored in either direction", body = ErrorResponse),
        (status = 404, description = "Recipient not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn send_private_message(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<SendPrivateMessageRequest>,
) -> GatewayResult<impl IntoResponse> {
    if payload.content.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "message content cannot be empty".to_string(),
        ));
    }

    let recipient = state
        .users
        .find_by_id(payload.to_user)
        .await?
        .ok_or_else(|| {
            GatewayError::NotFound(format!("no user with id {} found", payload.to_user))
        })?;

    // Either direction silencing the other refuses delivery.
    for (from, to) in [(user_id, recipient.id), (recipient.id, user_id)] {
        let silenced = state
            .relations
            .find_between(from, to)
            .await?
            .and_then(|r| r.status())
            .is_some_and(|s| s.silences());
        if silenced {
            return Err(GatewayError::Forbidden(
                "private messages between these users are disabled".to_string(),
            ));
        }
    }

    let message = state
        .private_messages
        .create(user_id, recipient.id, payload.content.trim())
        .await?;

    tracing::info!(from = user_id, to = recipient.id, "private message stored");

    let users = state.users.find_all().await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(PrivateMessageResponse::embed(message, &users)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/privateMsg/relation",
    tag = "Private messages",
    security(("bearer" = [])),
    request_body = UpdateRelationRequest,
    responses(
        (status = 200, description = "Updated relation row", body = RelationUpdatedResponse),
        (status = 400, description = "Unknown status code", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Target user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_relation(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<UpdateRelationRequest>,
) -> GatewayResult<Json<RelationUpdatedResponse>> {
    let status = RelationStatus::try_from(payload.status).map_err(|_| {
        GatewayError::InvalidRequest(format!("unknown relation status {}", payload.status))
    })?;

    if state.users.find_by_id(payload.to_user).await?.is_none() {
        return Err(GatewayError::NotFound(format!(
            "no user with id {} found",
            payload.to_user
        )));
    }

    let relation = state.relations.upsert(user_id, payload.to_user, status).await?;

    Ok(Json(RelationUpdatedResponse {
        user: relation.user_id,
        touser: relation.to_user_id,
        status: relation.status,
    }))
}
