//! Palaver Database Crate
//!
//! SQLite persistence for the Palaver chat backend: connection management,
//! embedded migrations, entity structs and repository implementations.

use sqlx::SqlitePool;
use palaver_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{
    MessageRepository, PrivateMessageRepository, RelationRepository, RoomRepository,
    UserRepository,
};

pub use entities::{
    message::Message,
    private_message::PrivateMessage,
    relation::{Relation, RelationStatus, RoomRelation},
    room::{CreateRoomRequest, Room},
    user::{CreateUserRequest, User},
};

pub use types::{
    errors::StoreError,
    StoreResult,
};

/// Prepare the connection pool and apply migrations.
pub async fn initialize_database(config: &DatabaseConfig) -> StoreResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_database() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let config = DatabaseConfig {
            url: db_url,
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();
        (pool, temp_dir)
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let (pool, _temp_dir) = create_test_database().await;

        // Migrations created the schema.
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'rooms'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let (pool, _temp_dir) = create_test_database().await;

        let result: (bool,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert!(result.0);
    }
}
