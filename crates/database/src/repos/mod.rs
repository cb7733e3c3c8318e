//! Data access layer for the chat system.
//!
//! Repositories provide the interface between route handlers
//! and the database; each one owns the SQL for a single table.

pub mod message_repository;
pub mod private_message_repository;
pub mod relation_repository;
pub mod room_repository;
pub mod user_repository;

pub use message_repository::MessageRepository;
pub use private_message_repository::PrivateMessageRepository;
pub use relation_repository::RelationRepository;
pub use room_repository::RoomRepository;
pub use user_repository::UserRepository;
