//! Repository for private message data access operations.

use crate::entities::PrivateMessage;
use crate::types::StoreResult;
use sqlx::SqlitePool;

/// Repository for private message database operations
#[derive(Clone)]
pub struct PrivateMessageRepository {
    pool: SqlitePool,
}

impl PrivateMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        to_user_id: i64,
        content: &str,
    ) -> StoreResult<PrivateMessage> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO private_messages (user_id, to_user_id, content, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(to_user_id)
        .bind(content)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(PrivateMessage {
            id: result.last_insert_rowid(),
            user_id,
            to_user_id,
            content: content.to_string(),
            created_at: now,
        })
    }

    /// Both directions of the conversation between two users, oldest first.
    pub async fn conversation(
        &self,
        user_id: i64,
        other_id: i64,
    ) -> StoreResult<Vec<PrivateMessage>> {
        let messages = sqlx::query_as::<_, PrivateMessage>(
            "SELECT * FROM private_messages
             WHERE (user_id = ? AND to_user_id = ?) OR (user_id = ? AND to_user_id = ?)
             ORDER BY created_at, id",
        )
        .bind(user_id)
        .bind(other_id)
        .bind(other_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}
