//! JWT claims structure used in access tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use subpool_entity::user::UserRole;

/// JWT claims payload embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user ID.
    pub sub: Uuid,
    /// Username for convenience.
    pub username: String,
    /// User role at the time of token issuance.
    pub role: UserRole,
    /// Token issuer.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
