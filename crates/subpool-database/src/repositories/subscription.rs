//! Subscription account repository (administrative surface).
//!
//! Engine-mediated capacity mutation lives in
//! [`PgSlotStore`](crate::store::PgSlotStore); this repository covers
//! registration and listing of accounts.

use sqlx::PgPool;
use uuid::Uuid;

use subpool_core::error::{AppError, ErrorKind};
use subpool_core::result::AppResult;
use subpool_core::types::pagination::{Page, PageRequest};
use subpool_entity::subscription::{CreateSubscription, Subscription};

/// Repository for subscription account registration and listing.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new subscription account. The account starts with all
    /// slots available.
    pub async fn create(&self, subscription: &CreateSubscription) -> AppResult<Subscription> {
        sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions \
             (service_provider_id, country_id, name, email, password_hash, \
              available_slots, total_slots, user_price, currency_id, \
              renewal_info, metadata, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9, $10, $11) \
             RETURNING *",
        )
        .bind(subscription.service_provider_id)
        .bind(subscription.country_id)
        .bind(&subscription.name)
        .bind(&subscription.email)
        .bind(&subscription.password_hash)
        .bind(subscription.total_slots)
        .bind(subscription.user_price)
        .bind(subscription.currency_id)
        .bind(&subscription.renewal_info)
        .bind(&subscription.metadata)
        .bind(subscription.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create subscription", e)
        })
    }

    /// Find a subscription by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find subscription", e)
            })
    }

    /// List subscriptions, newest first, optionally narrowed to a provider.
    pub async fn list(
        &self,
        service_provider_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<Page<Subscription>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscriptions \
             WHERE ($1::uuid IS NULL OR service_provider_id = $1)",
        )
        .bind(service_provider_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count subscriptions", e)
        })?;

        let items = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions \
             WHERE ($1::uuid IS NULL OR service_provider_id = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(service_provider_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list subscriptions", e)
        })?;

        Ok(Page::new(items, total as u64, page))
    }
}
