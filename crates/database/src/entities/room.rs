//! Room entity definitions

use serde::{Deserialize, Serialize};

pub const DEFAULT_ROOM_AVATAR: &str = "defaultRoom.png";

/// Name reserved for the landing room; it can never be deleted.
pub const HOME_ROOM: &str = "HOME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    /// Owning user.
    pub user_id: i64,
    /// True for publicly joinable rooms, false for password-gated ones.
    pub access: bool,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Stored avatar file name.
    pub avatar: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub password: Option<String>,
    pub avatar: Option<String>,
}
