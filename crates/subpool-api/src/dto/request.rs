//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username.
    #[validate(length(min = 3, max = 100))]
    pub username: String,
    /// Email.
    #[validate(email)]
    pub email: Option<String>,
    /// Password.
    #[validate(length(min = 8))]
    pub password: String,
}

/// Slot request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSlotBody {
    /// The service provider to get access to.
    pub service_provider_id: Uuid,
    /// Optional country scope for the search.
    pub country_id: Option<Uuid>,
}

/// Availability probe query parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    /// The service provider to probe.
    pub service_provider_id: Uuid,
    /// Optional country scope.
    pub country_id: Option<Uuid>,
}

/// Subscription account registration body (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    /// The provider this account belongs to.
    pub service_provider_id: Uuid,
    /// Country scope, if region-locked.
    pub country_id: Option<Uuid>,
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Account login email.
    #[validate(email)]
    pub email: String,
    /// Account login password (hashed before storage).
    #[validate(length(min = 1))]
    pub password: String,
    /// Fixed capacity of the account.
    #[validate(range(min = 1, max = 100))]
    pub total_slots: i32,
    /// Per-user price, if billed.
    pub user_price: Option<Decimal>,
    /// Billing currency.
    pub currency_id: Option<Uuid>,
    /// Opaque renewal details.
    pub renewal_info: Option<serde_json::Value>,
    /// Opaque extra metadata.
    pub metadata: Option<serde_json::Value>,
    /// Account expiry, if limited.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Subscription list filter (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFilter {
    /// Narrow the list to one provider.
    pub service_provider_id: Option<Uuid>,
}

/// Manual drain trigger body (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainRequestBody {
    /// The provider whose queue to drain.
    pub service_provider_id: Uuid,
    /// Optional country scope.
    pub country_id: Option<Uuid>,
}

/// Pending request list query (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuery {
    /// The provider whose queue to list.
    pub service_provider_id: Uuid,
    /// Optional country scope.
    pub country_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_body_uses_camel_case() {
        let body: RequestSlotBody = serde_json::from_str(
            r#"{"serviceProviderId":"8c2df5d1-6fd1-4d25-bbcd-031be7ea6b57"}"#,
        )
        .unwrap();
        assert!(body.country_id.is_none());
    }

    #[test]
    fn missing_provider_id_is_rejected() {
        let result = serde_json::from_str::<RequestSlotBody>(r#"{"countryId":null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_subscription_validates_slot_range() {
        let req = CreateSubscriptionRequest {
            service_provider_id: Uuid::new_v4(),
            country_id: None,
            name: "Family plan".to_string(),
            email: "owner@example.com".to_string(),
            password: "hunter22".to_string(),
            total_slots: 0,
            user_price: None,
            currency_id: None,
            renewal_info: None,
            metadata: None,
            expires_at: None,
        };
        assert!(validator::Validate::validate(&req).is_err());
    }
}
