//! Login and registration flows over the user repository.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use subpool_core::config::AuthConfig;
use subpool_core::result::AppResult;
use subpool_core::error::AppError;
use subpool_database::repositories::UserRepository;
use subpool_entity::user::{CreateUser, User, UserRole};

use crate::jwt::{Claims, JwtDecoder, JwtEncoder};
use crate::password::PasswordHasher;

/// Outcome of a successful login.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginOutcome {
    /// Signed access token.
    pub access_token: String,
    /// Access token expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// The authenticated user.
    pub user: User,
}

/// Authentication service: credential verification and token issuance.
#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserRepository,
    hasher: PasswordHasher,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(users: UserRepository, config: &AuthConfig) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
        }
    }

    /// Register a new member account.
    pub async fn register(
        &self,
        username: &str,
        email: Option<String>,
        password: &str,
    ) -> AppResult<User> {
        let password_hash = self.hasher.hash_password(password)?;
        let user = self
            .users
            .create(&CreateUser {
                username: username.to_string(),
                email,
                password_hash,
                role: UserRole::Member,
            })
            .await?;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue an access token.
    ///
    /// Unknown usernames and wrong passwords return the same error, so
    /// the response does not reveal which accounts exist.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Err(AppError::authentication("Invalid username or password"));
        };

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(AppError::authentication("Invalid username or password"));
        }

        if !user.can_login() {
            return Err(AppError::authorization("Account is suspended"));
        }

        let (access_token, expires_at) =
            self.encoder
                .generate_access_token(user.id, &user.username, user.role)?;
        self.users.touch_last_login(user.id).await?;
        info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(LoginOutcome {
            access_token,
            expires_at,
            user,
        })
    }

    /// Validate a bearer token and return its claims.
    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        self.decoder.decode_access_token(token)
    }

    /// Load the user a set of claims refers to, rejecting suspended
    /// accounts.
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Err(AppError::authentication("User no longer exists"));
        };
        if !user.can_login() {
            return Err(AppError::authorization("Account is suspended"));
        }
        Ok(user)
    }
}
