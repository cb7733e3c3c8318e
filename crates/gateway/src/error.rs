//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

/// One failed form field, keyed by its `param` in the response body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
}

/// Validation failures collected across a request, serialized as
/// `{"errors": {"<param>": {"param": ..., "msg": ...}}}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, param: &str, msg: &str) {
        self.0.insert(
            param.to_string(),
            FieldError {
                param: param.to_string(),
                msg: msg.to_string(),
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fail the request when any field error was collected.
    pub fn into_result(self) -> Result<(), GatewayError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Validation(self))
        }
    }
}

/// Generic error body for non-validation failures.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("internal server error: {0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::StorageError(_)
            | GatewayError::DatabaseError(_)
            | GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            GatewayError::Validation(errors) => json!({ "errors": errors }),
            other => json!({
                "error": status.as_str(),
                "message": other.to_string(),
            }),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<palaver_database::StoreError> for GatewayError {
    fn from(error: palaver_database::StoreError) -> Self {
        use palaver_database::StoreError;
        match error {
            StoreError::NotFound => GatewayError::NotFound("row not found".to_string()),
            StoreError::UniqueViolation(msg) => GatewayError::Conflict(msg),
            StoreError::Connection(msg)
            | StoreError::Migration(msg)
            | StoreError::Database(msg) => GatewayError::DatabaseError(msg),
        }
    }
}

impl From<palaver_auth::AuthError> for GatewayError {
    fn from(error: palaver_auth::AuthError) -> Self {
        use palaver_auth::AuthError;
        match error {
            AuthError::InvalidToken(msg) => GatewayError::AuthenticationFailed(msg),
            AuthError::TokenCreationFailed(msg) => GatewayError::InternalError(msg),
            AuthError::PasswordHashingFailed => {
                GatewayError::InternalError("password hashing failed".to_string())
            }
            AuthError::InvalidPasswordHash => {
                GatewayError::InternalError("stored password hash is invalid".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_body_shape() {
        let mut errors = FieldErrors::new();
        errors.push("room_taken", "Roomname already taken");

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["room_taken"]["param"], "room_taken");
        assert_eq!(value["room_taken"]["msg"], "Roomname already taken");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::NotFound(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Validation(FieldErrors::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            GatewayError::Forbidden(String::new()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.push("UserRoomExceeds", "You already created 3 rooms");
        assert!(matches!(
            errors.into_result(),
            Err(GatewayError::Validation(_))
        ));
    }
}
