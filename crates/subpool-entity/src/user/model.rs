//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;
use super::status::UserStatus;

/// A registered user in the SubPool directory.
///
/// The slot assignment engine treats users as read-only reference data;
/// identity is established by the API layer before any engine call.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role.
    pub role: UserRole,
    /// Account status.
    pub status: UserStatus,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the user can log in right now.
    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
}
