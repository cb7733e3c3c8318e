//! # Palaver Gateway Crate
//!
//! HTTP layer of the Palaver chat backend: room lifecycle, membership and
//! private messaging over REST, with bearer-token authentication.
//!
//! - **rest**: API endpoints with OpenAPI documentation
//! - **state**: Shared application state (pool, repositories, storage)
//! - **middleware**: Authentication, CORS and request logging
//! - **uploads**: Avatar and image file storage on disk

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod uploads;

pub use error::{GatewayError, GatewayResult};
pub use middleware::auth_middleware;
pub use state::GatewayState;

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    // Multipart avatar uploads go up to the configured limit; leave some
    // headroom for the surrounding form fields.
    let body_limit = state.storage.max_bytes() as usize + 64 * 1024;
    let serve_storage = ServeDir::new(state.storage.root());

    let arc_state = Arc::new(state);

    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(rest::create_rest_routes(arc_state.clone()).with_state(arc_state))
        .nest_service("/storage", serve_storage)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::create_cors_middleware())
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    // Swagger UI only in debug builds
    #[cfg(debug_assertions)]
    {
        #[derive(OpenApi)]
        #[openapi(
            paths(
                rest::health::health_check,
                rest::auth::register,
                rest::auth::login,
                rest::auth::me,
                rest::room::list_rooms,
                rest::room::get_room,
                rest::room::create_room,
                rest::room::update_room,
                rest::room::delete_room,
                rest::room::leave_room,
                rest::room::kick_user,
                rest::room::user_relations,
                rest::private_message::get_conversation,
                rest::private_message::send_private_message,
                rest::private_message::update_relation,
            ),
            components(
                schemas(
                    rest::UserResponse,
                    rest::health::HealthResponse,
                    rest::auth::RegisterRequest,
                    rest::auth::LoginRequest,
                    rest::auth::SessionResponse,
                    rest::room::RoomResponse,
                    rest::room::RoomSummaryResponse,
                    rest::room::RoomDetailResponse,
                    rest::room::RoomMemberResponse,
                    rest::room::RelationResponse,
                    rest::room::LeaveRoomRequest,
                    rest::room::KickUserRequest,
                    rest::private_message::PrivateMessageResponse,
                    rest::private_message::ConversationResponse,
                    rest::private_message::SendPrivateMessageRequest,
                    rest::private_message::UpdateRelationRequest,
                    rest::private_message::RelationUpdatedResponse,
                    error::ErrorResponse,
                    error::FieldError,
                )
            ),
            tags(
                (name = "Health", description = "Service health"),
                (name = "Auth", description = "Registration and login"),
                (name = "Rooms", description = "Room lifecycle and membership"),
                (name = "Private messages", description = "Direct messaging and relations"),
            )
        )]
        struct ApiDoc;

        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
}
