//! Private message entity definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PrivateMessage {
    pub id: i64,
    pub user_id: i64,
    pub to_user_id: i64,
    pub content: String,
    pub created_at: String,
}
