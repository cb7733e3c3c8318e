//! Authentication primitives for the Palaver backend: JWT bearer tokens
//! and argon2 password hashing. There is no session storage; a token is
//! self-contained.

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtManager};
pub use password::{hash_password, verify_password};

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("token creation failed: {0}")]
    TokenCreationFailed(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("password hashing failed")]
    PasswordHashingFailed,

    #[error("invalid password hash")]
    InvalidPasswordHash,
}

pub type AuthResult<T> = Result<T, AuthError>;
