//! Error types for the persistence layer.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database connection error: {0}")]
    Connection(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                if message.contains("UNIQUE constraint failed") {
                    StoreError::UniqueViolation(message)
                } else {
                    StoreError::Database(message)
                }
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}
