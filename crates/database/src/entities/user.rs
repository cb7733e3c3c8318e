//! User entity definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 hash, never exposed through the REST surface.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: String,
    /// Room the user currently sits in, if any.
    pub room_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password_hash: String,
    pub avatar: Option<String>,
}
