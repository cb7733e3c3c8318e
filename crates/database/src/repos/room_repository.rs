//! Repository for room data access operations.

use crate::entities::room::{CreateRoomRequest, Room, DEFAULT_ROOM_AVATAR};
use crate::types::StoreResult;
use sqlx::SqlitePool;
use tracing::info;

/// Repository for room database operations
#[derive(Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new room owned by `user_id`.
    ///
    /// A room is public exactly when no password was supplied.
    pub async fn create(&self, user_id: i64, request: &CreateRoomRequest) -> StoreResult<Room> {
        let now = chrono::Utc::now().to_rfc3339();
        let access = request.password.is_none();
        let avatar = request
            .avatar
            .clone()
            .unwrap_or_else(|| DEFAULT_ROOM_AVATAR.to_string());

        let result = sqlx::query(
            "INSERT INTO rooms (name, user_id, access, password, avatar, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.name)
        .bind(user_id)
        .bind(access)
        .bind(&request.password)
        .bind(&avatar)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let room_id = result.last_insert_rowid();
        info!(room_id, name = %request.name, owner = user_id, "created new room");

        Ok(Room {
            id: room_id,
            name: request.name.clone(),
            user_id,
            access,
            password: request.password.clone(),
            avatar,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    pub async fn find_by_name(&self, name: &str) -> StoreResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    pub async fn count_all(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_owner(&self, user_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Rename a room, optionally swapping its avatar. Returns the updated
    /// row, or `None` when no room carries `name`.
    pub async fn rename(
        &self,
        name: &str,
        new_name: &str,
        avatar: Option<&str>,
    ) -> StoreResult<Option<Room>> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = match avatar {
            Some(avatar) => {
                sqlx::query(
                    "UPDATE rooms SET name = ?, avatar = ?, updated_at = ? WHERE name = ?",
                )
                .bind(new_name)
                .bind(avatar)
                .bind(&now)
                .bind(name)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("UPDATE rooms SET name = ?, updated_at = ? WHERE name = ?")
                    .bind(new_name)
                    .bind(&now)
                    .bind(name)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_name(new_name).await
    }

    /// Delete a room by name. Returns true when a row was removed.
    pub async fn delete_by_name(&self, name: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(name, "deleted room");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::test_support::{create_test_pool, insert_user};

    fn request(name: &str, password: Option<&str>) -> CreateRoomRequest {
        CreateRoomRequest {
            name: name.to_string(),
            password: password.map(str::to_string),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_create_room_access_flag() {
        let (pool, _temp_dir) = create_test_pool().await;
        let owner = insert_user(&pool, "owner").await;
        let repo = RoomRepository::new(pool);

        let open = repo.create(owner, &request("open", None)).await.unwrap();
        assert!(open.access);
        assert_eq!(open.avatar, DEFAULT_ROOM_AVATAR);

        let gated = repo
            .create(owner, &request("gated", Some("hunter2")))
            .await
            .unwrap();
        assert!(!gated.access);
        assert_eq!(gated.password.as_deref(), Some("hunter2"));
    }

    #[tokio::test]
    async fn test_name_uniqueness() {
        let (pool, _temp_dir) = create_test_pool().await;
        let owner = insert_user(&pool, "owner").await;
        let repo = RoomRepository::new(pool);

        repo.create(owner, &request("lobby", None)).await.unwrap();
        let err = repo
            .create(owner, &request("lobby", None))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_counts() {
        let (pool, _temp_dir) = create_test_pool().await;
        let a = insert_user(&pool, "a").await;
        let b = insert_user(&pool, "b").await;
        let repo = RoomRepository::new(pool);

        repo.create(a, &request("one", None)).await.unwrap();
        repo.create(a, &request("two", None)).await.unwrap();
        repo.create(b, &request("three", None)).await.unwrap();

        assert_eq!(repo.count_all().await.unwrap(), 3);
        assert_eq!(repo.count_by_owner(a).await.unwrap(), 2);
        assert_eq!(repo.count_by_owner(b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rename() {
        let (pool, _temp_dir) = create_test_pool().await;
        let owner = insert_user(&pool, "owner").await;
        let repo = RoomRepository::new(pool);

        repo.create(owner, &request("before", None)).await.unwrap();

        let renamed = repo
            .rename("before", "after", Some("new.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "after");
        assert_eq!(renamed.avatar, "new.png");
        assert!(repo.find_by_name("before").await.unwrap().is_none());

        assert!(repo.rename("missing", "x", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_name() {
        let (pool, _temp_dir) = create_test_pool().await;
        let owner = insert_user(&pool, "owner").await;
        let repo = RoomRepository::new(pool);

        repo.create(owner, &request("doomed", None)).await.unwrap();
        assert!(repo.delete_by_name("doomed").await.unwrap());
        assert!(!repo.delete_by_name("doomed").await.unwrap());
        assert!(repo.find_by_name("doomed").await.unwrap().is_none());
    }
}
