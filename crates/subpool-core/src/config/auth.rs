//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// JWT and password hashing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_minutes")]
    pub access_token_minutes: i64,
    /// Token issuer claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_access_minutes() -> i64 {
    60
}

fn default_issuer() -> String {
    "subpool".to_string()
}
