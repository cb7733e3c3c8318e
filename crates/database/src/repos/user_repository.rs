//! Repository for user data access operations.

use crate::entities::{CreateUserRequest, User};
use crate::types::StoreResult;
use sqlx::SqlitePool;
use tracing::info;

const DEFAULT_USER_AVATAR: &str = "defaultUser.png";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, request: &CreateUserRequest) -> StoreResult<User> {
        let now = chrono::Utc::now().to_rfc3339();
        let avatar = request
            .avatar
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AVATAR.to_string());

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, avatar, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(&avatar)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();
        info!(user_id, username = %request.username, "created new user");

        Ok(User {
            id: user_id,
            username: request.username.clone(),
            password_hash: request.password_hash.clone(),
            avatar,
            room_id: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_all(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Users currently inside a room
    pub async fn find_by_room(&self, room_id: i64) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE room_id = ? ORDER BY id",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn count_by_room(&self, room_id: i64) -> StoreResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE room_id = ?")
                .bind(room_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn count_all(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Move a user into a room, or out of any room with `None`.
    /// Returns false when the user does not exist.
    pub async fn set_room(&self, user_id: i64, room_id: Option<i64>) -> StoreResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE users SET room_id = ?, updated_at = ? WHERE id = ?")
            .bind(room_id)
            .bind(&now)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::test_support::create_test_pool;

    fn request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password_hash: "argon2-hash".to_string(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let created = repo.create(&request("alice")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.avatar, DEFAULT_USER_AVATAR);
        assert_eq!(created.room_id, None);

        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool);

        repo.create(&request("bob")).await.unwrap();
        let err = repo.create(&request("bob")).await.unwrap_err();
        assert!(matches!(err, crate::StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_room_membership() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());

        let owner = repo.create(&request("owner")).await.unwrap();
        let guest = repo.create(&request("guest")).await.unwrap();

        let now = chrono::Utc::now().to_rfc3339();
        let room_id = sqlx::query(
            "INSERT INTO rooms (name, user_id, access, avatar, created_at, updated_at)
             VALUES ('lobby', ?, 1, 'defaultRoom.png', ?, ?)",
        )
        .bind(owner.id)
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        assert!(repo.set_room(guest.id, Some(room_id)).await.unwrap());
        assert_eq!(repo.count_by_room(room_id).await.unwrap(), 1);
        let members = repo.find_by_room(room_id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, guest.id);

        assert!(repo.set_room(guest.id, None).await.unwrap());
        assert_eq!(repo.count_by_room(room_id).await.unwrap(), 0);

        assert!(!repo.set_room(9999, None).await.unwrap());
        assert_eq!(repo.count_all().await.unwrap(), 2);
    }
}
