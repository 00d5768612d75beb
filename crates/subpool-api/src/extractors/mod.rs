//! Custom Axum extractors.

pub mod auth;
pub mod json;
pub mod pagination;

pub use auth::AuthUser;
pub use json::Json;
pub use pagination::PaginationParams;
