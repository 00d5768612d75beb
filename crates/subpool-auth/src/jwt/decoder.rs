//! JWT access token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use subpool_core::config::AuthConfig;
use subpool_core::error::AppError;

use super::claims::Claims;

/// Validates JWT access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew
        validation.set_issuer(&[&config.issuer]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    ///
    /// Checks signature validity, expiration, and issuer.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use subpool_entity::user::UserRole;
    use uuid::Uuid;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            access_token_minutes: 60,
            issuer: "subpool".to_string(),
        }
    }

    #[test]
    fn encode_then_decode_preserves_claims() {
        let cfg = config("test-secret");
        let encoder = JwtEncoder::new(&cfg);
        let decoder = JwtDecoder::new(&cfg);

        let user_id = Uuid::new_v4();
        let (token, _) = encoder
            .generate_access_token(user_id, "alice", UserRole::Member)
            .unwrap();

        let claims = decoder.decode_access_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::Member);
        assert_eq!(claims.iss, "subpool");
        assert!(!claims.is_expired());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let encoder = JwtEncoder::new(&config("secret-a"));
        let decoder = JwtDecoder::new(&config("secret-b"));

        let (token, _) = encoder
            .generate_access_token(Uuid::new_v4(), "alice", UserRole::Member)
            .unwrap();
        assert!(decoder.decode_access_token(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let decoder = JwtDecoder::new(&config("test-secret"));
        assert!(decoder.decode_access_token("not.a.jwt").is_err());
    }
}
