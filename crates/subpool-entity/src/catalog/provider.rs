//! Service provider entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A third-party service (e.g. a streaming platform) whose access is
/// being shared.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceProvider {
    /// Unique provider identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Category label (e.g. "streaming", "music").
    pub category: Option<String>,
    /// Provider website.
    pub website_url: Option<String>,
    /// Inactive providers are invisible to the assignment engine.
    pub is_active: bool,
    /// When the provider was created.
    pub created_at: DateTime<Utc>,
    /// When the provider was last updated.
    pub updated_at: DateTime<Utc>,
}
