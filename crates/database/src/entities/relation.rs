//! Relation entity definitions
//!
//! A `Relation` row is directed: `user_id` holds an attitude towards
//! `to_user_id`. The integer coding is shared with the clients.

use serde::{Deserialize, Serialize};

/// Directed standing between two users: governs private messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum RelationStatus {
    Block,
    Ignore,
    Active,
}

impl RelationStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            RelationStatus::Block => 0,
            RelationStatus::Ignore => 1,
            RelationStatus::Active => 2,
        }
    }

    /// A block or ignore relation suppresses the private conversation.
    pub fn silences(self) -> bool {
        matches!(self, RelationStatus::Block | RelationStatus::Ignore)
    }
}

impl From<RelationStatus> for i64 {
    fn from(status: RelationStatus) -> Self {
        status.as_i64()
    }
}

impl TryFrom<i64> for RelationStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RelationStatus::Block),
            1 => Ok(RelationStatus::Ignore),
            2 => Ok(RelationStatus::Active),
            other => Err(format!("unknown relation status {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Relation {
    pub id: i64,
    pub user_id: i64,
    pub to_user_id: i64,
    pub status: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Relation {
    pub fn status(&self) -> Option<RelationStatus> {
        RelationStatus::try_from(self.status).ok()
    }
}

/// Room-scoped standing of a user; status 2 marks a ban.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoomRelation {
    pub id: i64,
    pub room_id: i64,
    pub user_id: i64,
    pub status: i64,
    pub created_at: String,
}

impl RoomRelation {
    pub const BANNED: i64 = 2;

    pub fn is_banned(&self) -> bool {
        self.status == Self::BANNED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for raw in 0..=2 {
            let status = RelationStatus::try_from(raw).unwrap();
            assert_eq!(status.as_i64(), raw);
        }
        assert!(RelationStatus::try_from(7).is_err());
    }

    #[test]
    fn test_silencing_statuses() {
        assert!(RelationStatus::Block.silences());
        assert!(RelationStatus::Ignore.silences());
        assert!(!RelationStatus::Active.silences());
    }
}
