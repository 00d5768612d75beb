//! User directory repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use subpool_core::error::{AppError, ErrorKind};
use subpool_core::result::AppResult;
use subpool_entity::user::{CreateUser, User};

/// Repository for user directory lookups and registration.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    /// Create a user record.
    pub async fn create(&self, user: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|d| d.is_unique_violation())
            {
                AppError::conflict("Username is already taken")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create user", e)
            }
        })
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update last login", e)
            })?;
        Ok(())
    }
}
