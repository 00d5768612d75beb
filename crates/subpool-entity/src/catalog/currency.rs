//! Currency entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A currency used to price subscription shares.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Currency {
    /// Unique currency identifier.
    pub id: Uuid,
    /// ISO 4217 code (e.g. "EUR").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Currency symbol (e.g. "€").
    pub symbol: Option<String>,
}
