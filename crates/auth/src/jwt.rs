//! JWT (JSON Web Token) utilities for authentication.

use crate::{AuthError, AuthResult};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use palaver_config::AuthConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
    pub nbf: usize,  // Not before
    pub iss: String, // Issuer
    pub aud: String, // Audience
    pub jti: String, // JWT ID
}

impl Claims {
    /// Numeric user id carried in `sub`.
    pub fn user_id(&self) -> AuthResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("non-numeric subject".to_string()))
    }
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    token_duration: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, issuer: String, audience: String) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_ref());
        let decoding_key = DecodingKey::from_secret(secret.as_ref());

        Self {
            encoding_key,
            decoding_key,
            issuer,
            audience,
            token_duration: Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.issuer.clone(),
            config.audience.clone(),
        )
        .with_duration(Duration::from_secs(config.token_ttl_seconds))
    }

    /// Set custom token duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.token_duration = duration;
        self
    }

    /// Generate a new JWT token for a user
    pub fn generate_token(&self, user_id: i64) -> AuthResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::TokenCreationFailed("system time error".to_string()))?;

        let exp = now + self.token_duration;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.as_secs() as usize,
            iat: now.as_secs() as usize,
            nbf: now.as_secs() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenCreationFailed("failed to encode token".to_string()))
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| AuthError::InvalidToken(format!("token validation failed: {err}")))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_jwt_manager() -> JwtManager {
        JwtManager::new(
            "test_secret_key_that_is_long_enough_for_hs256",
            "test_issuer".to_string(),
            "test_audience".to_string(),
        )
    }

    #[test]
    fn test_token_generation_and_validation() {
        let jwt_manager = create_test_jwt_manager();

        let token = jwt_manager.generate_token(123).unwrap();
        assert!(!token.is_empty());

        let claims = jwt_manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "123");
        assert_eq!(claims.user_id().unwrap(), 123);
        assert_eq!(claims.iss, "test_issuer");
        assert_eq!(claims.aud, "test_audience");
    }

    #[test]
    fn test_invalid_token() {
        let jwt_manager = create_test_jwt_manager();

        let result = jwt_manager.validate_token("invalid.jwt.token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuing = create_test_jwt_manager();
        let validating = JwtManager::new(
            "a_completely_different_secret_value_here",
            "test_issuer".to_string(),
            "test_audience".to_string(),
        );

        let token = issuing.generate_token(7).unwrap();
        assert!(validating.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let issuing = create_test_jwt_manager();
        let validating = JwtManager::new(
            "test_secret_key_that_is_long_enough_for_hs256",
            "test_issuer".to_string(),
            "someone_else".to_string(),
        );

        let token = issuing.generate_token(7).unwrap();
        assert!(validating.validate_token(&token).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = palaver_config::AuthConfig::default();
        let jwt_manager = JwtManager::from_config(&config);

        let token = jwt_manager.generate_token(42).unwrap();
        let claims = jwt_manager.validate_token(&token).unwrap();
        assert_eq!(claims.iss, config.issuer);
    }
}
