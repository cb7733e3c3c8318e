//! Room message entity definitions

use serde::{Deserialize, Serialize};

/// Prefix marking a message whose payload is an uploaded image file name.
pub const IMAGE_MESSAGE_PREFIX: &str = "!!!image!!!";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub room_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: String,
}

impl Message {
    /// File name of the uploaded image this message references, if any.
    pub fn image_file_name(&self) -> Option<&str> {
        self.content.strip_prefix(IMAGE_MESSAGE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_file_name() {
        let msg = Message {
            id: 1,
            room_id: 1,
            user_id: 1,
            content: format!("{IMAGE_MESSAGE_PREFIX}cat.png"),
            created_at: String::new(),
        };
        assert_eq!(msg.image_file_name(), Some("cat.png"));

        let plain = Message {
            content: "hello".to_string(),
            ..msg
        };
        assert_eq!(plain.image_file_name(), None);
    }
}
