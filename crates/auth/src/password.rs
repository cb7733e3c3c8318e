//! Password hashing and verification utilities.

use crate::{AuthError, AuthResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHashingFailed)?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidPasswordHash)?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hash1 = hash_password("same").unwrap();
        let hash2 = hash_password("same").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_garbage_hash_rejected() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::InvalidPasswordHash)));
    }
}
