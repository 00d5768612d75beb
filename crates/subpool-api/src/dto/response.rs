//! Response DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use subpool_core::types::pagination::Page;
use subpool_entity::catalog::{Country, Currency, ServiceProvider};
use subpool_entity::request::{RequestStatus, SubscriptionRequest};
use subpool_entity::slot::SubscriptionSlot;
use subpool_entity::subscription::Subscription;
use subpool_entity::user::User;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Total item count.
    pub total: u64,
    /// Current page.
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
    /// Total pages.
    pub total_pages: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Maps a domain page into the wire shape.
    pub fn from_page<S>(page: Page<S>, map: impl Fn(S) -> T) -> Self {
        let total_pages = page.total_pages();
        Self {
            total: page.total,
            page: page.page,
            per_page: page.page_size,
            total_pages,
            items: page.items.into_iter().map(map).collect(),
        }
    }
}

/// User summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Email.
    pub email: Option<String>,
    /// Role.
    pub role: String,
    /// Status.
    pub status: String,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Last login.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            status: user.status.to_string(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Access token.
    pub access_token: String,
    /// Access token expiration.
    pub expires_at: DateTime<Utc>,
    /// User info.
    pub user: UserResponse,
}

/// Subscription account view. Credentials are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    /// Subscription ID.
    pub id: Uuid,
    /// Provider ID.
    pub service_provider_id: Uuid,
    /// Country scope.
    pub country_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Remaining capacity.
    pub available_slots: i32,
    /// Fixed capacity.
    pub total_slots: i32,
    /// Per-user price.
    pub user_price: Option<Decimal>,
    /// Billing currency.
    pub currency_id: Option<Uuid>,
    /// Account expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether visible to the assignment engine.
    pub is_active: bool,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            service_provider_id: s.service_provider_id,
            country_id: s.country_id,
            name: s.name,
            available_slots: s.available_slots,
            total_slots: s.total_slots,
            user_price: s.user_price,
            currency_id: s.currency_id,
            expires_at: s.expires_at,
            is_active: s.is_active,
            created_at: s.created_at,
        }
    }
}

/// Slot grant view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    /// Slot ID.
    pub id: Uuid,
    /// Holder.
    pub user_id: Uuid,
    /// The subscription the slot lives on.
    pub subscription_id: Uuid,
    /// Whether the grant is current.
    pub is_active: bool,
    /// When the slot was granted.
    pub assigned_at: DateTime<Utc>,
    /// When the slot was released.
    pub released_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionSlot> for SlotResponse {
    fn from(slot: SubscriptionSlot) -> Self {
        Self {
            id: slot.id,
            user_id: slot.user_id,
            subscription_id: slot.subscription_id,
            is_active: slot.is_active,
            assigned_at: slot.assigned_at,
            released_at: slot.released_at,
        }
    }
}

/// Subscription request view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    /// Request ID.
    pub id: Uuid,
    /// Requesting user.
    pub user_id: Uuid,
    /// Requested provider.
    pub service_provider_id: Uuid,
    /// Country scope.
    pub country_id: Option<Uuid>,
    /// Current status, serialized as `PENDING`, `ASSIGNED`, `REJECTED`,
    /// or `CANCELLED`.
    pub status: RequestStatus,
    /// Slot granted to satisfy the request, if any.
    pub assigned_slot_id: Option<Uuid>,
    /// When the user asked.
    pub requested_at: DateTime<Utc>,
    /// When the request left PENDING.
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionRequest> for RequestResponse {
    fn from(r: SubscriptionRequest) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            service_provider_id: r.service_provider_id,
            country_id: r.country_id,
            status: r.status,
            assigned_slot_id: r.assigned_slot_id,
            requested_at: r.requested_at,
            processed_at: r.processed_at,
        }
    }
}

/// Assignment call response: the request plus the slot when granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    /// The request row (ASSIGNED or PENDING).
    pub request: RequestResponse,
    /// The granted slot, when one was reserved.
    pub slot: Option<SlotResponse>,
    /// Outcome summary.
    pub message: String,
}

/// Availability probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    /// Whether capacity exists right now.
    pub available: bool,
    /// The subscription the engine would pick.
    pub subscription: Option<SubscriptionResponse>,
}

/// Service provider view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    /// Provider ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Category label.
    pub category: Option<String>,
    /// Provider site.
    pub website_url: Option<String>,
}

impl From<ServiceProvider> for ProviderResponse {
    fn from(p: ServiceProvider) -> Self {
        Self {
            id: p.id,
            name: p.name,
            category: p.category,
            website_url: p.website_url,
        }
    }
}

/// Country view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryResponse {
    /// Country ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    pub iso_code: String,
}

impl From<Country> for CountryResponse {
    fn from(c: Country) -> Self {
        Self {
            id: c.id,
            name: c.name,
            iso_code: c.iso_code,
        }
    }
}

/// Currency view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyResponse {
    /// Currency ID.
    pub id: Uuid,
    /// ISO 4217 code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Symbol.
    pub symbol: Option<String>,
}

impl From<Currency> for CurrencyResponse {
    fn from(c: Currency) -> Self {
        Self {
            id: c.id,
            code: c.code,
            name: c.name,
            symbol: c.symbol,
        }
    }
}

/// Drain pass summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReportResponse {
    /// Requests transitioned to ASSIGNED.
    pub assigned: u32,
    /// Requests skipped.
    pub skipped: u32,
    /// Requests that hit an error and stay PENDING.
    pub failed: u32,
    /// Requests left PENDING for lack of capacity.
    pub remaining_pending: u32,
}

impl From<subpool_engine::DrainReport> for DrainReportResponse {
    fn from(r: subpool_engine::DrainReport) -> Self {
        Self {
            assigned: r.assigned,
            skipped: r.skipped,
            failed: r.failed,
            remaining_pending: r.remaining_pending,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Database status.
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_response_serializes_camel_case_and_uppercase_status() {
        let resp = RequestResponse {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            service_provider_id: Uuid::new_v4(),
            country_id: None,
            status: RequestStatus::Pending,
            assigned_slot_id: None,
            requested_at: Utc::now(),
            processed_at: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert!(json.get("serviceProviderId").is_some());
        assert!(json.get("service_provider_id").is_none());
    }
}
