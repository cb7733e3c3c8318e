//! Room REST endpoints: lifecycle, membership and per-room relations.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, FieldErrors, GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::rest::UserResponse;
use crate::state::GatewayState;
use palaver_database::entities::relation::RelationStatus;
use palaver_database::entities::room::HOME_ROOM;
use palaver_database::{CreateRoomRequest, Relation, Room, User};

const MAX_ROOMS_TOTAL: i64 = 100;
const MAX_ROOMS_PER_USER: i64 = 3;

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomResponse {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub access: bool,
    pub avatar: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            user_id: room.user_id,
            access: room.access,
            avatar: room.avatar,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

/// Listing shape: the owner row embedded under `user`, membership as a count.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSummaryResponse {
    #[serde(flatten)]
    pub room: RoomResponse,
    pub user: Option<UserResponse>,
    pub users: i64,
}

/// Detail shape: the member rows themselves, each optionally annotated with
/// the requester's relation statuses.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomDetailResponse {
    #[serde(flatten)]
    pub room: RoomResponse,
    pub users: Vec<RoomMemberResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_relations: Option<Vec<RelationResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomMemberResponse {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub room_id: Option<i64>,
    /// Requester's outgoing relation status towards this user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<i64>,
    /// This user's relation status towards the requester.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}

impl RoomMemberResponse {
    fn plain(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            room_id: user.room_id,
            from: None,
            to: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RelationResponse {
    pub user: i64,
    pub touser: i64,
    pub status: i64,
}

impl From<&Relation> for RelationResponse {
    fn from(relation: &Relation) -> Self {
        Self {
            user: relation.user_id,
            touser: relation.to_user_id,
            status: relation.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveRoomRequest {
    pub room_id: i64,
    /// User to remove; defaults to the requester.
    pub user: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct KickUserRequest {
    pub userid: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteRoomQuery {
    /// When set, only delete the room if it has no members left.
    pub check: Option<bool>,
}

/// How the `users` count of a listing is computed.
enum CountMode {
    /// Private rooms address everyone but the requester.
    Listing,
    /// Plain member counts for every room.
    Membership,
}

/// Create room routes
pub fn create_room_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/room", get(list_rooms).post(create_room))
        .route("/api/room/update/name", post(update_room))
        .route("/api/room/remove/users", post(leave_room))
        .route("/api/room/remove/users/all", put(kick_user))
        .route("/api/room/userRelations/:room_id", get(user_relations))
        .route("/api/room/:room_key", get(get_room).delete(delete_room))
}

fn summarize_rooms(rooms: Vec<Room>, users: &[User], mode: CountMode) -> Vec<RoomSummaryResponse> {
    let total_users = users.len() as i64;

    rooms
        .into_iter()
        .map(|room| {
            let owner = users
                .iter()
                .find(|user| user.id == room.user_id)
                .map(UserResponse::from);
            let members = users
                .iter()
                .filter(|user| user.room_id == Some(room.id))
                .count() as i64;

            let count = match mode {
                CountMode::Membership => members,
                CountMode::Listing if room.access => members,
                CountMode::Listing => (total_users - 1).max(0),
            };

            RoomSummaryResponse {
                room: room.into(),
                user: owner,
                users: count,
            }
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/room",
    tag = "Rooms",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All rooms with owners and member counts", body = Vec<RoomSummaryResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_rooms(
    State(state): State<Arc<GatewayState>>,
) -> GatewayResult<Json<Vec<RoomSummaryResponse>>> {
    let rooms = state.rooms.find_all().await?;
    let users = state.users.find_all().await?;

    Ok(Json(summarize_rooms(rooms, &users, CountMode::Listing)))
}

#[utoipa::path(
    get,
    path = "/api/room/{room_id}",
    tag = "Rooms",
    security(("bearer" = [])),
    params(("room_id" = i64, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room detail with members and relation annotations", body = RoomDetailResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_room(
    Path(room_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> GatewayResult<Response> {
    let room = state
        .rooms
        .find_by_id(room_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("no room with id {room_id} found")))?;

    if room.access {
        // Public room: a ban in the room or a block by its owner shuts
        // the requester out.
        let room_standing = state.relations.find_room_relation(room.id, user_id).await?;
        let owner_attitude = state.relations.find_between(room.user_id, user_id).await?;

        let banned = room_standing.as_ref().is_some_and(|r| r.is_banned());
        let blocked_by_owner = owner_attitude
            .as_ref()
            .and_then(Relation::status)
            .is_some_and(|s| s == RelationStatus::Block);

        if banned || blocked_by_owner {
            return Ok(Json(json!({ "msg": "You are blocked" })).into_response());
        }

        let members = state.users.find_by_room(room.id).await?;
        let my_relations = state.relations.find_from_user(user_id).await?;
        let status = room_standing.map(|r| r.status).unwrap_or(0);

        let response = RoomDetailResponse {
            room: room.into(),
            users: members.iter().map(RoomMemberResponse::plain).collect(),
            private_relations: Some(my_relations.iter().map(RelationResponse::from).collect()),
            status: Some(status),
        };
        Ok(Json(response).into_response())
    } else {
        // Private room: every user is listed, annotated with the relation
        // statuses in both directions.
        let users = state.users.find_all().await?;
        let relations = state.relations.find_all().await?;

        let annotated = users
            .iter()
            .map(|user| {
                let from = relations
                    .iter()
                    .find(|r| r.user_id == user_id && r.to_user_id == user.id)
                    .map(|r| r.status);
                let to = relations
                    .iter()
                    .find(|r| r.user_id == user.id && r.to_user_id == user_id)
                    .map(|r| r.status);
                RoomMemberResponse {
                    from,
                    to,
                    ..RoomMemberResponse::plain(user)
                }
            })
            .collect();

        let response = RoomDetailResponse {
            room: room.into(),
            users: annotated,
            private_relations: None,
            status: None,
        };
        Ok(Json(response).into_response())
    }
}

#[utoipa::path(
    post,
    path = "/api/room",
    tag = "Rooms",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Room created", body = RoomSummaryResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_room(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    multipart: Multipart,
) -> GatewayResult<impl IntoResponse> {
    let form = RoomForm::from_multipart(multipart).await?;

    let Some(room_name) = form.room_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    else {
        return Err(GatewayError::InvalidRequest(
            "room_name field is required".to_string(),
        ));
    };

    let mut errors = FieldErrors::new();
    let name_chars = room_name.chars().count();
    if !(3..=20).contains(&name_chars) {
        errors.push("room_name", "Room Name must be between 3 and 20 characters");
    }
    if state.rooms.find_by_name(room_name).await?.is_some() {
        errors.push("room_taken", "Roomname already taken");
    }
    if state.rooms.count_all().await? >= MAX_ROOMS_TOTAL {
        errors.push("totalRoomExceeds", "Already created 100 rooms");
    }
    if state.rooms.count_by_owner(user_id).await? >= MAX_ROOMS_PER_USER {
        errors.push("UserRoomExceeds", "You already created 3 rooms");
    }
    errors.into_result()?;

    let avatar = form.store_avatar(&state).await?;

    let room = state
        .rooms
        .create(
            user_id,
            &CreateRoomRequest {
                name: room_name.to_string(),
                password: form.password,
                avatar,
            },
        )
        .await?;

    let owner = state.users.find_by_id(user_id).await?.map(UserResponse::from);

    Ok((
        axum::http::StatusCode::CREATED,
        Json(RoomSummaryResponse {
            room: room.into(),
            user: owner,
            users: 0,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/room/update/name",
    tag = "Rooms",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Room renamed", body = RoomDetailResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 409, description = "New name already taken", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_room(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(_user_id)): Extension<CurrentUser>,
    multipart: Multipart,
) -> GatewayResult<Json<RoomDetailResponse>> {
    let form = RoomForm::from_multipart(multipart).await?;

    let room_name = form
        .room_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| GatewayError::InvalidRequest("room_name field is required".to_string()))?;
    let new_room_name = form
        .new_room_name
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();

    let mut errors = FieldErrors::new();
    let name_chars = new_room_name.chars().count();
    if !(3..=20).contains(&name_chars) {
        errors.push(
            "new_room_name",
            "New Room Name must be between 3 and 20 characters",
        );
    }
    errors.into_result()?;

    let previous = state
        .rooms
        .find_by_name(room_name)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("no room with name {room_name} found")))?;

    // The avatar is replaced on every rename: either by the uploaded file
    // or by the default image.
    let avatar = form
        .store_avatar(&state)
        .await?
        .unwrap_or_else(|| palaver_database::entities::room::DEFAULT_ROOM_AVATAR.to_string());

    let room = state
        .rooms
        .rename(room_name, new_room_name, Some(avatar.as_str()))
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("no room with name {room_name} found")))?;

    if previous.avatar != room.avatar {
        state.storage.remove_room_avatar(&previous.avatar).await;
    }

    let members = state.users.find_by_room(room.id).await?;

    Ok(Json(RoomDetailResponse {
        room: room.into(),
        users: members.iter().map(RoomMemberResponse::plain).collect(),
        private_relations: None,
        status: None,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/room/{room_name}",
    tag = "Rooms",
    security(("bearer" = [])),
    params(
        ("room_name" = String, Path, description = "Room name"),
        DeleteRoomQuery
    ),
    responses(
        (status = 200, description = "The deleted room", body = RoomResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "The HOME room cannot be deleted", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 409, description = "Room still has members", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_room(
    Path(room_name): Path<String>,
    Query(query): Query<DeleteRoomQuery>,
    State(state): State<Arc<GatewayState>>,
) -> GatewayResult<Json<RoomResponse>> {
    if room_name == HOME_ROOM {
        return Err(GatewayError::Forbidden(
            "the HOME room cannot be deleted".to_string(),
        ));
    }

    let room = state
        .rooms
        .find_by_name(&room_name)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("no room with name {room_name} found")))?;

    if query.check.unwrap_or(false) {
        let members = state.users.count_by_room(room.id).await?;
        if members > 0 {
            return Err(GatewayError::Conflict(
                "room still has members".to_string(),
            ));
        }
    }

    // Snapshot the message log before it goes: uploaded image files are
    // removed from disk along with the room.
    let messages = state.messages.find_by_room(room.id).await?;

    // Rows referencing the room go first, the room row last.
    state.messages.delete_by_room(room.id).await?;
    state.relations.delete_by_room(room.id).await?;

    if !state.rooms.delete_by_name(&room_name).await? {
        return Err(GatewayError::NotFound(format!(
            "no room with name {room_name} found"
        )));
    }

    for file_name in messages.iter().filter_map(|m| m.image_file_name()) {
        state.storage.remove_upload(file_name).await;
    }
    state.storage.remove_room_avatar(&room.avatar).await;

    tracing::info!(room_id = room.id, name = %room.name, "room deleted");

    Ok(Json(room.into()))
}

#[utoipa::path(
    post,
    path = "/api/room/remove/users",
    tag = "Rooms",
    security(("bearer" = [])),
    request_body = LeaveRoomRequest,
    responses(
        (status = 200, description = "The room with its remaining members", body = RoomDetailResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn leave_room(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<LeaveRoomRequest>,
) -> GatewayResult<Json<RoomDetailResponse>> {
    let room = state
        .rooms
        .find_by_id(payload.room_id)
        .await?
        .ok_or_else(|| {
            GatewayError::NotFound(format!("no room with id {} found", payload.room_id))
        })?;

    let target = payload.user.unwrap_or(user_id);
    state.users.set_room(target, None).await?;

    let members = state.users.find_by_room(room.id).await?;

    Ok(Json(RoomDetailResponse {
        room: room.into(),
        users: members.iter().map(RoomMemberResponse::plain).collect(),
        private_relations: None,
        status: None,
    }))
}

#[utoipa::path(
    put,
    path = "/api/room/remove/users/all",
    tag = "Rooms",
    security(("bearer" = [])),
    request_body = KickUserRequest,
    responses(
        (status = 200, description = "The full room listing after removal", body = Vec<RoomSummaryResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn kick_user(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<KickUserRequest>,
) -> GatewayResult<Json<Vec<RoomSummaryResponse>>> {
    if !state.users.set_room(payload.userid, None).await? {
        return Err(GatewayError::NotFound(format!(
            "no user with id {} found",
            payload.userid
        )));
    }

    let rooms = state.rooms.find_all().await?;
    let users = state.users.find_all().await?;

    Ok(Json(summarize_rooms(rooms, &users, CountMode::Membership)))
}

#[utoipa::path(
    get,
    path = "/api/room/userRelations/{room_id}",
    tag = "Rooms",
    security(("bearer" = [])),
    params(("room_id" = i64, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room members annotated with the requester's outgoing relation", body = Vec<RoomMemberResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn user_relations(
    Path(room_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> GatewayResult<Json<Vec<RoomMemberResponse>>> {
    let my_relations = state.relations.find_from_user(user_id).await?;
    let members = state.users.find_by_room(room_id).await?;

    let annotated = members
        .iter()
        .map(|member| {
            let from = my_relations
                .iter()
                .find(|r| r.to_user_id == member.id)
                .map(|r| r.status)
                .unwrap_or(0);
            RoomMemberResponse {
                from: Some(from),
                ..RoomMemberResponse::plain(member)
            }
        })
        .collect();

    Ok(Json(annotated))
}

/// Parsed multipart form for room create/update: text fields plus an
/// optional avatar upload.
struct RoomForm {
    room_name: Option<String>,
    new_room_name: Option<String>,
    password: Option<String>,
    avatar: Option<(String, Vec<u8>)>,
}

impl RoomForm {
    async fn from_multipart(mut multipart: Multipart) -> GatewayResult<Self> {
        let mut form = Self {
            room_name: None,
            new_room_name: None,
            password: None,
            avatar: None,
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| GatewayError::InvalidRequest(format!("malformed multipart body: {e}")))?
        {
            match field.name() {
                Some("room_name") => {
                    form.room_name = Some(field.text().await.map_err(|e| {
                        GatewayError::InvalidRequest(format!("invalid room_name field: {e}"))
                    })?);
                }
                Some("new_room_name") => {
                    form.new_room_name = Some(field.text().await.map_err(|e| {
                        GatewayError::InvalidRequest(format!("invalid new_room_name field: {e}"))
                    })?);
                }
                Some("password") => {
                    let password = field.text().await.map_err(|e| {
                        GatewayError::InvalidRequest(format!("invalid password field: {e}"))
                    })?;
                    // An empty password field still means a public room.
                    if !password.is_empty() {
                        form.password = Some(password);
                    }
                }
                Some("room_avatar") => {
                    let Some(file_name) = field.file_name().map(str::to_string) else {
                        continue;
                    };
                    let bytes = field.bytes().await.map_err(|e| {
                        GatewayError::InvalidRequest(format!("invalid avatar upload: {e}"))
                    })?;
                    form.avatar = Some((file_name, bytes.to_vec()));
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Store the uploaded avatar, if any. Uploads with an unsupported
    /// extension are dropped silently and the default avatar applies.
    async fn store_avatar(&self, state: &GatewayState) -> GatewayResult<Option<String>> {
        let Some((file_name, bytes)) = &self.avatar else {
            return Ok(None);
        };

        if crate::uploads::AvatarStore::accepted_extension(file_name).is_some() {
            let stored = state.storage.save_room_avatar(file_name, bytes).await?;
            Ok(Some(stored))
        } else {
            tracing::warn!(file_name = %file_name, "dropping avatar upload with unsupported type");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: i64, name: &str, owner: i64, access: bool) -> Room {
        Room {
            id,
            name: name.to_string(),
            user_id: owner,
            access,
            password: (!access).then(|| "secret".to_string()),
            avatar: "defaultRoom.png".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn user(id: i64, name: &str, room_id: Option<i64>) -> User {
        User {
            id,
            username: name.to_string(),
            password_hash: String::new(),
            avatar: "defaultUser.png".to_string(),
            room_id,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_listing_counts() {
        let rooms = vec![room(1, "open", 1, true), room(2, "gated", 2, false)];
        let users = vec![
            user(1, "a", Some(1)),
            user(2, "b", Some(1)),
            user(3, "c", None),
        ];

        let summaries = summarize_rooms(rooms, &users, CountMode::Listing);
        // Public room counts its members, private rooms everyone but you.
        assert_eq!(summaries[0].users, 2);
        assert_eq!(summaries[1].users, 2);
        assert_eq!(summaries[0].user.as_ref().unwrap().id, 1);
    }

    #[test]
    fn test_membership_counts() {
        let rooms = vec![room(1, "open", 1, true), room(2, "gated", 2, false)];
        let users = vec![user(1, "a", Some(2)), user(2, "b", Some(2))];

        let summaries = summarize_rooms(rooms, &users, CountMode::Membership);
        assert_eq!(summaries[0].users, 0);
        assert_eq!(summaries[1].users, 2);
    }

    #[test]
    fn test_missing_owner_is_none() {
        let rooms = vec![room(1, "orphan", 99, true)];
        let users = vec![user(1, "a", None)];

        let summaries = summarize_rooms(rooms, &users, CountMode::Listing);
        assert!(summaries[0].user.is_none());
    }
}
