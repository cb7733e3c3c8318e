//! Entity definitions mirroring the database schema.

pub mod message;
pub mod private_message;
pub mod relation;
pub mod room;
pub mod user;

pub use message::Message;
pub use private_message::PrivateMessage;
pub use relation::{Relation, RelationStatus, RoomRelation};
pub use room::{CreateRoomRequest, Room};
pub use user::{CreateUserRequest, User};
