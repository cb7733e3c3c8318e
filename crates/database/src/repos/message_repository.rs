//! Repository for room message data access operations.

use crate::entities::Message;
use crate::types::StoreResult;
use sqlx::SqlitePool;
use tracing::info;

/// Repository for room message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, room_id: i64, user_id: i64, content: &str) -> StoreResult<Message> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO messages (room_id, user_id, content, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(room_id)
        .bind(user_id)
        .bind(content)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            room_id,
            user_id,
            content: content.to_string(),
            created_at: now,
        })
    }

    pub async fn find_by_room(&self, room_id: i64) -> StoreResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE room_id = ? ORDER BY created_at, id",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// Remove a room's entire message log.
    pub async fn delete_by_room(&self, room_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE room_id = ?")
            .bind(room_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!(room_id, removed, "deleted room messages");
        }
        Ok(removed)
    }
}
