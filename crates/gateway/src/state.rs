//! Shared application state for the gateway

use palaver_auth::JwtManager;
use palaver_config::{AppConfig, AuthConfig, StorageConfig};
use palaver_database::{
    MessageRepository, PrivateMessageRepository, RelationRepository, RoomRepository,
    UserRepository,
};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::uploads::AvatarStore;

/// Shared application state: the pool, repositories and auth plumbing.
#[derive(Clone)]
pub struct GatewayState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtManager>,
    pub storage: AvatarStore,
    pub users: UserRepository,
    pub rooms: RoomRepository,
    pub relations: RelationRepository,
    pub messages: MessageRepository,
    pub private_messages: PrivateMessageRepository,
}

impl GatewayState {
    /// Wire up all repositories over an existing pool.
    pub fn new(pool: SqlitePool, auth: &AuthConfig, storage: &StorageConfig) -> Self {
        Self {
            jwt: Arc::new(JwtManager::from_config(auth)),
            storage: AvatarStore::new(storage),
            users: UserRepository::new(pool.clone()),
            rooms: RoomRepository::new(pool.clone()),
            relations: RelationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            private_messages: PrivateMessageRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect, migrate and wire up state from the application config.
    pub async fn from_config(config: &AppConfig) -> crate::GatewayResult<Self> {
        let pool = palaver_database::initialize_database(&config.database).await?;
        Ok(Self::new(pool, &config.auth, &config.storage))
    }
}
