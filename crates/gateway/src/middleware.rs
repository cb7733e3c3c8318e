//! Middleware for authentication and other cross-cutting concerns

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::state::GatewayState;

/// Authenticated user id, inserted into request extensions by
/// [`auth_middleware`] and read back by handlers.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

/// Authentication middleware that validates JWT bearer tokens
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(|| {
            GatewayError::AuthenticationFailed("missing authentication token".to_string())
        })?;

    let claims = state.jwt.validate_token(token)?;
    let user_id = claims.user_id()?;

    request.extensions_mut().insert(CurrentUser(user_id));

    Ok(next.run(request).await)
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "request completed"
    );

    Ok(response)
}

/// CORS middleware for cross-origin requests
pub fn create_cors_middleware() -> tower_http::cors::CorsLayer {
    tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
}
