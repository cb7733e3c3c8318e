//! Repository for user relations and room-scoped relations.

use crate::entities::relation::{Relation, RelationStatus, RoomRelation};
use crate::types::StoreResult;
use sqlx::SqlitePool;
use tracing::info;

/// Repository for relation database operations
#[derive(Clone)]
pub struct RelationRepository {
    pool: SqlitePool,
}

impl RelationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The directed relation `user_id` holds towards `to_user_id`, if any.
    pub async fn find_between(
        &self,
        user_id: i64,
        to_user_id: i64,
    ) -> StoreResult<Option<Relation>> {
        let relation = sqlx::query_as::<_, Relation>(
            "SELECT * FROM relations WHERE user_id = ? AND to_user_id = ?",
        )
        .bind(user_id)
        .bind(to_user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(relation)
    }

    /// All outgoing relation rows of a user.
    pub async fn find_from_user(&self, user_id: i64) -> StoreResult<Vec<Relation>> {
        let relations =
            sqlx::query_as::<_, Relation>("SELECT * FROM relations WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(relations)
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Relation>> {
        let relations = sqlx::query_as::<_, Relation>("SELECT * FROM relations ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(relations)
    }

    /// Insert or update the directed relation row.
    pub async fn upsert(
        &self,
        user_id: i64,
        to_user_id: i64,
        status: RelationStatus,
    ) -> StoreResult<Relation> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO relations (user_id, to_user_id, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id, to_user_id)
             DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(to_user_id)
        .bind(status.as_i64())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        info!(user_id, to_user_id, status = status.as_i64(), "relation updated");

        let relation = self
            .find_between(user_id, to_user_id)
            .await?
            .ok_or(crate::StoreError::NotFound)?;
        Ok(relation)
    }

    /// The room-scoped relation row for a user, if any.
    pub async fn find_room_relation(
        &self,
        room_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<RoomRelation>> {
        let relation = sqlx::query_as::<_, RoomRelation>(
            "SELECT * FROM room_relations WHERE room_id = ? AND user_id = ?",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(relation)
    }

    /// Drop all room-scoped relation rows of a room.
    pub async fn delete_by_room(&self, room_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM room_relations WHERE room_id = ?")
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::test_support::{create_test_pool, insert_user};

    #[tokio::test]
    async fn test_upsert_is_directed() {
        let (pool, _temp_dir) = create_test_pool().await;
        let a = insert_user(&pool, "a").await;
        let b = insert_user(&pool, "b").await;
        let repo = RelationRepository::new(pool);

        repo.upsert(a, b, RelationStatus::Block).await.unwrap();

        let forward = repo.find_between(a, b).await.unwrap().unwrap();
        assert_eq!(forward.status(), Some(RelationStatus::Block));

        // The reverse direction stays untouched.
        assert!(repo.find_between(b, a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_status() {
        let (pool, _temp_dir) = create_test_pool().await;
        let a = insert_user(&pool, "a").await;
        let b = insert_user(&pool, "b").await;
        let repo = RelationRepository::new(pool);

        repo.upsert(a, b, RelationStatus::Ignore).await.unwrap();
        repo.upsert(a, b, RelationStatus::Active).await.unwrap();

        let rows = repo.find_from_user(a).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status(), Some(RelationStatus::Active));
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_room_relations() {
        let (pool, _temp_dir) = create_test_pool().await;
        let owner = insert_user(&pool, "owner").await;
        let guest = insert_user(&pool, "guest").await;

        let now = chrono::Utc::now().to_rfc3339();
        let room_id = sqlx::query(
            "INSERT INTO rooms (name, user_id, access, avatar, created_at, updated_at)
             VALUES ('lobby', ?, 1, 'defaultRoom.png', ?, ?)",
        )
        .bind(owner)
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        sqlx::query(
            "INSERT INTO room_relations (room_id, user_id, status, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(room_id)
        .bind(guest)
        .bind(RoomRelation::BANNED)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap();

        let repo = RelationRepository::new(pool);
        let relation = repo
            .find_room_relation(room_id, guest)
            .await
            .unwrap()
            .unwrap();
        assert!(relation.is_banned());
        assert!(repo
            .find_room_relation(room_id, owner)
            .await
            .unwrap()
            .is_none());

        assert_eq!(repo.delete_by_room(room_id).await.unwrap(), 1);
        assert!(repo
            .find_room_relation(room_id, guest)
            .await
            .unwrap()
            .is_none());
    }
}
