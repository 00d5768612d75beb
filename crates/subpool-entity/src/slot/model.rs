//! Subscription slot entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An active grant binding one user to one subscription account.
///
/// At most one active slot may exist per (user, service provider); the
/// engine enforces this inside the reservation transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionSlot {
    /// Unique slot identifier.
    pub id: Uuid,
    /// The member holding the slot.
    pub user_id: Uuid,
    /// The subscription account the slot belongs to.
    pub subscription_id: Uuid,
    /// Released slots stay on record with `is_active = false`.
    pub is_active: bool,
    /// When the slot was granted.
    pub assigned_at: DateTime<Utc>,
    /// When the slot was released, if it has been.
    pub released_at: Option<DateTime<Utc>>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}
