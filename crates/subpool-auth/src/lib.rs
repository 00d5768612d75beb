//! # subpool-auth
//!
//! Authentication for the SubPool platform.
//!
//! ## Modules
//!
//! - `jwt` — JWT access token creation and validation
//! - `password` — Argon2id password hashing
//! - `service` — login and registration flows over the user repository

pub mod jwt;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
pub use service::AuthService;
