//! User account status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account status for a directory user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Normal account, can authenticate.
    Active,
    /// Suspended by an administrator, cannot authenticate.
    Suspended,
}

impl UserStatus {
    /// Whether a user with this status may log in.
    pub fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
