//! Country entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A country used to scope subscriptions and requests.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Country {
    /// Unique country identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    pub iso_code: String,
}
