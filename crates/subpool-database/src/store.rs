//! Transactional Postgres implementation of the engine's store seam.
//!
//! The reservation path is a single scoped transaction: an advisory
//! lock on (user, provider), duplicate-grant re-check, conditional
//! decrement (`available_slots > 0` at write time), slot insert, and
//! request transition commit together or not at all. A zero-row
//! decrement means the race was lost and surfaces as
//! [`ReserveOutcome::LostRace`] for the engine to re-select.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use subpool_core::error::{AppError, ErrorKind};
use subpool_core::result::AppResult;
use subpool_engine::{ReserveOrigin, ReserveOutcome, SelectionPolicy, SlotStore};
use subpool_entity::request::{RequestStatus, SubscriptionRequest};
use subpool_entity::slot::SubscriptionSlot;
use subpool_entity::subscription::Subscription;

/// Postgres-backed [`SlotStore`].
#[derive(Debug, Clone)]
pub struct PgSlotStore {
    pool: PgPool,
}

impl PgSlotStore {
    /// Create a new Postgres slot store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
        move |e| AppError::with_source(ErrorKind::Database, context, e)
    }
}

/// Fold a UUID into a 32-bit advisory lock key.
///
/// A key collision between distinct ids only serializes two unrelated
/// reservations; it never lets two related ones proceed in parallel.
fn advisory_key(id: Uuid) -> i32 {
    let (hi, lo) = id.as_u64_pair();
    let folded = hi ^ lo;
    (folded as i32) ^ ((folded >> 32) as i32)
}

#[async_trait]
impl SlotStore for PgSlotStore {
    async fn find_active_slot(
        &self,
        user_id: Uuid,
        service_provider_id: Uuid,
    ) -> AppResult<Option<SubscriptionSlot>> {
        sqlx::query_as::<_, SubscriptionSlot>(
            "SELECT ss.* FROM subscription_slots ss \
             JOIN subscriptions s ON s.id = ss.subscription_id \
             WHERE ss.user_id = $1 AND ss.is_active = TRUE \
               AND s.service_provider_id = $2 \
             LIMIT 1",
        )
        .bind(user_id)
        .bind(service_provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_err("Failed to find active slot"))
    }

    async fn active_slots_for_user(&self, user_id: Uuid) -> AppResult<Vec<SubscriptionSlot>> {
        sqlx::query_as::<_, SubscriptionSlot>(
            "SELECT * FROM subscription_slots \
             WHERE user_id = $1 AND is_active = TRUE \
             ORDER BY assigned_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_err("Failed to list user slots"))
    }

    async fn find_eligible(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
        policy: SelectionPolicy,
    ) -> AppResult<Vec<Subscription>> {
        let query = format!(
            "SELECT * FROM subscriptions \
             WHERE service_provider_id = $1 AND is_active = TRUE \
               AND available_slots > 0 \
               AND ($2::uuid IS NULL OR country_id = $2) \
             ORDER BY {}",
            policy.sql_order_clause()
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(service_provider_id)
            .bind(country_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::db_err("Failed to query eligible subscriptions"))
    }

    async fn subscription_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::db_err("Failed to find subscription"))
    }

    async fn try_reserve(
        &self,
        subscription_id: Uuid,
        user_id: Uuid,
        service_provider_id: Uuid,
        origin: ReserveOrigin,
    ) -> AppResult<ReserveOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(Self::db_err("Failed to begin reservation transaction"))?;

        // Serialize reservations per (user, provider). The slot table's
        // unique index is per subscription, so without this lock two
        // in-flight transactions could grant the same user slots on
        // sibling subscriptions of one provider.
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(advisory_key(user_id))
            .bind(advisory_key(service_provider_id))
            .execute(&mut *tx)
            .await
            .map_err(Self::db_err("Failed to take reservation lock"))?;

        // Re-check the duplicate-grant invariant inside the transaction,
        // so the check and the reservation share one consistency boundary.
        let already_assigned: bool = sqlx::query_scalar(
            "SELECT EXISTS( \
               SELECT 1 FROM subscription_slots ss \
               JOIN subscriptions s ON s.id = ss.subscription_id \
               WHERE ss.user_id = $1 AND ss.is_active = TRUE \
                 AND s.service_provider_id = $2)",
        )
        .bind(user_id)
        .bind(service_provider_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Self::db_err("Failed to check existing slot"))?;
        if already_assigned {
            return Ok(ReserveOutcome::AlreadyAssigned);
        }

        // Lock the originating request so a concurrent cancel cannot
        // slip between the status check and the transition below.
        if let ReserveOrigin::Request(request_id) = origin {
            let status: Option<RequestStatus> = sqlx::query_scalar(
                "SELECT status FROM subscription_requests WHERE id = $1 FOR UPDATE",
            )
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Self::db_err("Failed to lock request"))?;
            match status {
                None => return Err(AppError::not_found("Request not found")),
                Some(RequestStatus::Pending) => {}
                Some(_) => return Ok(ReserveOutcome::RequestNotPending),
            }
        }

        // The conditional decrement: affects one row only when capacity
        // is still positive at write time.
        let decremented = sqlx::query(
            "UPDATE subscriptions \
             SET available_slots = available_slots - 1, updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE AND available_slots > 0",
        )
        .bind(subscription_id)
        .execute(&mut *tx)
        .await
        .map_err(Self::db_err("Failed to decrement available slots"))?;
        if decremented.rows_affected() != 1 {
            return Ok(ReserveOutcome::LostRace);
        }

        let slot = match sqlx::query_as::<_, SubscriptionSlot>(
            "INSERT INTO subscription_slots (user_id, subscription_id) \
             VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(subscription_id)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(slot) => slot,
            Err(e)
                if e.as_database_error()
                    .is_some_and(|d| d.is_unique_violation()) =>
            {
                return Ok(ReserveOutcome::AlreadyAssigned);
            }
            Err(e) => return Err(Self::db_err("Failed to create slot")(e)),
        };

        let request = match origin {
            ReserveOrigin::Request(request_id) => sqlx::query_as::<_, SubscriptionRequest>(
                "UPDATE subscription_requests \
                 SET status = $2, assigned_slot_id = $3, \
                     processed_at = NOW(), updated_at = NOW() \
                 WHERE id = $1 AND status = $4 \
                 RETURNING *",
            )
            .bind(request_id)
            .bind(RequestStatus::Assigned)
            .bind(slot.id)
            .bind(RequestStatus::Pending)
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::db_err("Failed to mark request assigned"))?,
            ReserveOrigin::Direct { country_id } => sqlx::query_as::<_, SubscriptionRequest>(
                "INSERT INTO subscription_requests \
                 (user_id, service_provider_id, country_id, status, \
                  assigned_slot_id, processed_at) \
                 VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
            )
            .bind(user_id)
            .bind(service_provider_id)
            .bind(country_id)
            .bind(RequestStatus::Assigned)
            .bind(slot.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::db_err("Failed to record assigned request"))?,
        };

        tx.commit()
            .await
            .map_err(Self::db_err("Failed to commit reservation"))?;

        Ok(ReserveOutcome::Reserved { slot, request })
    }

    async fn create_or_reuse_pending(
        &self,
        user_id: Uuid,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<SubscriptionRequest> {
        let existing = sqlx::query_as::<_, SubscriptionRequest>(
            "SELECT * FROM subscription_requests \
             WHERE user_id = $1 AND service_provider_id = $2 \
               AND country_id IS NOT DISTINCT FROM $3 AND status = $4 \
             LIMIT 1",
        )
        .bind(user_id)
        .bind(service_provider_id)
        .bind(country_id)
        .bind(RequestStatus::Pending)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_err("Failed to look up pending request"))?;
        if let Some(request) = existing {
            return Ok(request);
        }

        let inserted = sqlx::query_as::<_, SubscriptionRequest>(
            "INSERT INTO subscription_requests \
             (user_id, service_provider_id, country_id, status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT DO NOTHING RETURNING *",
        )
        .bind(user_id)
        .bind(service_provider_id)
        .bind(country_id)
        .bind(RequestStatus::Pending)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_err("Failed to create pending request"))?;
        if let Some(request) = inserted {
            return Ok(request);
        }

        // A concurrent call created the row first; the partial unique
        // index guarantees it exists now.
        sqlx::query_as::<_, SubscriptionRequest>(
            "SELECT * FROM subscription_requests \
             WHERE user_id = $1 AND service_provider_id = $2 \
               AND country_id IS NOT DISTINCT FROM $3 AND status = $4 \
             LIMIT 1",
        )
        .bind(user_id)
        .bind(service_provider_id)
        .bind(country_id)
        .bind(RequestStatus::Pending)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::db_err("Failed to re-read pending request"))
    }

    async fn pending_requests(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<Vec<SubscriptionRequest>> {
        sqlx::query_as::<_, SubscriptionRequest>(
            "SELECT * FROM subscription_requests \
             WHERE service_provider_id = $1 AND status = $3 \
               AND ($2::uuid IS NULL OR country_id = $2) \
             ORDER BY requested_at ASC",
        )
        .bind(service_provider_id)
        .bind(country_id)
        .bind(RequestStatus::Pending)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_err("Failed to list pending requests"))
    }

    async fn requests_for_user(&self, user_id: Uuid) -> AppResult<Vec<SubscriptionRequest>> {
        sqlx::query_as::<_, SubscriptionRequest>(
            "SELECT * FROM subscription_requests \
             WHERE user_id = $1 ORDER BY requested_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_err("Failed to list user requests"))
    }

    async fn request_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionRequest>> {
        sqlx::query_as::<_, SubscriptionRequest>(
            "SELECT * FROM subscription_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_err("Failed to find request"))
    }

    async fn slot_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionSlot>> {
        sqlx::query_as::<_, SubscriptionSlot>("SELECT * FROM subscription_slots WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::db_err("Failed to find slot"))
    }

    async fn transition_request(
        &self,
        request_id: Uuid,
        next: RequestStatus,
    ) -> AppResult<SubscriptionRequest> {
        let updated = sqlx::query_as::<_, SubscriptionRequest>(
            "UPDATE subscription_requests \
             SET status = $2, processed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = $3 \
             RETURNING *",
        )
        .bind(request_id)
        .bind(next)
        .bind(RequestStatus::Pending)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_err("Failed to transition request"))?;

        match updated {
            Some(request) => Ok(request),
            None => {
                let current = self.request_by_id(request_id).await?;
                match current {
                    None => Err(AppError::not_found("Request not found")),
                    Some(request) => Err(AppError::conflict(format!(
                        "Request is {} and cannot become {next}",
                        request.status
                    ))),
                }
            }
        }
    }

    async fn release_slot(&self, slot_id: Uuid) -> AppResult<SubscriptionSlot> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(Self::db_err("Failed to begin release transaction"))?;

        let released = sqlx::query_as::<_, SubscriptionSlot>(
            "UPDATE subscription_slots \
             SET is_active = FALSE, released_at = NOW() \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING *",
        )
        .bind(slot_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Self::db_err("Failed to release slot"))?;

        let Some(released) = released else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM subscription_slots WHERE id = $1)")
                    .bind(slot_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(Self::db_err("Failed to check slot"))?;
            return Err(if exists {
                AppError::conflict("Slot is already released")
            } else {
                AppError::not_found("Slot not found")
            });
        };

        // Symmetric to the reservation decrement.
        sqlx::query(
            "UPDATE subscriptions \
             SET available_slots = available_slots + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(released.subscription_id)
        .execute(&mut *tx)
        .await
        .map_err(Self::db_err("Failed to increment available slots"))?;

        tx.commit()
            .await
            .map_err(Self::db_err("Failed to commit release"))?;

        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_key_is_stable_per_id() {
        let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        assert_eq!(advisory_key(id), advisory_key(id));
    }

    #[test]
    fn advisory_key_separates_distinct_ids() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert_ne!(advisory_key(a), advisory_key(b));
    }
}
