//! REST API endpoints for the gateway

pub mod auth;
pub mod health;
pub mod private_message;
pub mod room;

use crate::middleware::auth_middleware;
use crate::state::GatewayState;
use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;

/// All REST routes; everything except `/health` and the login/register
/// endpoints sits behind the bearer-token middleware.
pub fn create_rest_routes(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    let protected = Router::new()
        .merge(room::create_room_routes())
        .merge(private_message::create_private_message_routes())
        .merge(auth::create_protected_auth_routes())
        .layer(axum_middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::create_public_auth_routes())
        .merge(protected)
}

/// Embedded user record reused across room and private-message responses.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub room_id: Option<i64>,
}

impl From<palaver_database::User> for UserResponse {
    fn from(user: palaver_database::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar: user.avatar,
            room_id: user.room_id,
        }
    }
}

impl From<&palaver_database::User> for UserResponse {
    fn from(user: &palaver_database::User) -> Self {
        user.clone().into()
    }
}
