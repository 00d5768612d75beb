//! Subscription entity model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One shared account for a service provider with a fixed slot capacity.
///
/// `available_slots` never goes negative: it only decreases through an
/// engine-mediated reservation and increases through slot release.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Unique subscription identifier.
    pub id: Uuid,
    /// The provider this account belongs to.
    pub service_provider_id: Uuid,
    /// Country scope, if the account is region-locked.
    pub country_id: Option<Uuid>,
    /// Display name for the account.
    pub name: String,
    /// Account login email.
    pub email: String,
    /// Account credential hash, never exposed over the API.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Capacity remaining for new members.
    pub available_slots: i32,
    /// Fixed capacity of the account.
    pub total_slots: i32,
    /// Price charged per member.
    pub user_price: Option<Decimal>,
    /// Currency of `user_price`.
    pub currency_id: Option<Uuid>,
    /// Renewal details, passed through opaquely.
    pub renewal_info: Option<serde_json::Value>,
    /// Free-form metadata, passed through opaquely.
    pub metadata: Option<serde_json::Value>,
    /// When the account expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
    /// Inactive subscriptions are invisible to the assignment engine.
    pub is_active: bool,
    /// When the subscription was registered.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the engine may currently place a member on this account.
    pub fn has_capacity(&self) -> bool {
        self.is_active && self.available_slots > 0
    }

    /// Number of slots currently occupied by members.
    pub fn occupied_slots(&self) -> i32 {
        self.total_slots - self.available_slots
    }
}

/// Data required to register a new subscription account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    /// The provider this account belongs to.
    pub service_provider_id: Uuid,
    /// Country scope, if region-locked.
    pub country_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Account login email.
    pub email: String,
    /// Pre-hashed account credential.
    pub password_hash: String,
    /// Fixed capacity of the account.
    pub total_slots: i32,
    /// Price charged per member.
    pub user_price: Option<Decimal>,
    /// Currency of `user_price`.
    pub currency_id: Option<Uuid>,
    /// Renewal details.
    pub renewal_info: Option<serde_json::Value>,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
    /// When the account expires.
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(available: i32, active: bool) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            service_provider_id: Uuid::new_v4(),
            country_id: None,
            name: "family".to_string(),
            email: "acct@example.com".to_string(),
            password_hash: "hash".to_string(),
            available_slots: available,
            total_slots: 4,
            user_price: None,
            currency_id: None,
            renewal_info: None,
            metadata: None,
            expires_at: None,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_capacity() {
        assert!(subscription(1, true).has_capacity());
        assert!(!subscription(0, true).has_capacity());
        assert!(!subscription(3, false).has_capacity());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(subscription(2, true)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["available_slots"], 2);
    }
}
