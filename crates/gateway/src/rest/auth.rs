//! Authentication REST endpoints

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, FieldErrors, GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::rest::UserResponse;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Routes reachable without a token
pub fn create_public_auth_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

/// Routes behind the bearer-token middleware
pub fn create_protected_auth_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/api/auth/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<RegisterRequest>,
) -> GatewayResult<impl IntoResponse> {
    let mut errors = FieldErrors::new();

    let username = payload.username.trim();
    let username_chars = username.chars().count();
    if !(3..=20).contains(&username_chars) {
        errors.push(
            "username",
            "Username must be between 3 and 20 characters",
        );
    }
    if payload.password.len() < 6 {
        errors.push("password", "Password must be at least 6 characters");
    }
    if state.users.find_by_username(username).await?.is_some() {
        errors.push("username_taken", "Username already taken");
    }
    errors.into_result()?;

    let password_hash = palaver_auth::hash_password(&payload.password)?;
    let user = state
        .users
        .create(&palaver_database::CreateUserRequest {
            username: username.to_string(),
            password_hash,
            avatar: None,
        })
        .await?;

    let token = state.jwt.generate_token(user.id)?;
    tracing::info!(user_id = user.id, username = %user.username, "registered user");

    Ok((
        axum::http::StatusCode::CREATED,
        Json(SessionResponse {
            user: user.into(),
            token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<LoginRequest>,
) -> GatewayResult<Json<SessionResponse>> {
    let user = state
        .users
        .find_by_username(payload.username.trim())
        .await?
        .ok_or_else(|| {
            GatewayError::AuthenticationFailed("invalid credentials".to_string())
        })?;

    if !palaver_auth::verify_password(&payload.password, &user.password_hash)? {
        return Err(GatewayError::AuthenticationFailed(
            "invalid credentials".to_string(),
        ));
    }

    let token = state.jwt.generate_token(user.id)?;

    Ok(Json(SessionResponse {
        user: user.into(),
        token,
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound("user not found".to_string()))?;

    Ok(Json(user.into()))
}
