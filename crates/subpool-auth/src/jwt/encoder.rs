//! JWT access token creation with configurable signing and TTL.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use subpool_core::config::AuthConfig;
use subpool_core::error::AppError;
use subpool_entity::user::UserRole;

use super::claims::Claims;

/// Creates signed JWT access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
    /// Issuer claim stamped on every token.
    issuer: String,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_minutes: config.access_token_minutes,
            issuer: config.issuer.clone(),
        }
    }

    /// Generates a signed access token for the given user.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        username: &str,
        role: UserRole,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::minutes(self.access_ttl_minutes);

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            role,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok((token, exp))
    }
}
