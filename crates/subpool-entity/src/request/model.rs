//! Subscription request entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::RequestStatus;

/// A user's ask for access to a service provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionRequest {
    /// Unique request identifier.
    pub id: Uuid,
    /// The requesting user.
    pub user_id: Uuid,
    /// The provider access is requested for.
    pub service_provider_id: Uuid,
    /// Country scope for the search, if any.
    pub country_id: Option<Uuid>,
    /// Lifecycle state.
    pub status: RequestStatus,
    /// The slot granted to this request, once assigned.
    pub assigned_slot_id: Option<Uuid>,
    /// When the user asked for access.
    pub requested_at: DateTime<Utc>,
    /// When the request reached a terminal state.
    pub processed_at: Option<DateTime<Utc>>,
    /// Free-form metadata, passed through opaquely.
    pub metadata: Option<serde_json::Value>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRequest {
    /// Whether the drainer should still consider this request.
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}
