//! Store seam between the engine and its persistence backend.
//!
//! Implementations must guarantee atomicity of [`SlotStore::try_reserve`]:
//! the conditional capacity decrement, the slot insert, and the request
//! transition either all commit or all roll back. The Postgres store uses
//! a scoped transaction with a conditional `UPDATE`; the in-memory store
//! serializes reservations behind one `tokio::sync::Mutex`.

use async_trait::async_trait;
use uuid::Uuid;

use subpool_core::AppResult;
use subpool_entity::request::{RequestStatus, SubscriptionRequest};
use subpool_entity::slot::SubscriptionSlot;
use subpool_entity::subscription::Subscription;

use crate::policy::SelectionPolicy;

/// Where a reservation originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOrigin {
    /// A direct API call; a new request row recording the ask is created
    /// in the ASSIGNED state within the reservation transaction.
    Direct {
        /// Country scope the caller searched with, recorded on the request.
        country_id: Option<Uuid>,
    },
    /// The drainer re-attempting an existing PENDING request.
    Request(Uuid),
}

/// Result of one atomic reservation attempt.
#[derive(Debug, Clone)]
pub enum ReserveOutcome {
    /// The slot was reserved and the request recorded as ASSIGNED.
    Reserved {
        /// The granted slot.
        slot: SubscriptionSlot,
        /// The request row, now ASSIGNED with `assigned_slot_id` set.
        request: SubscriptionRequest,
    },
    /// The conditional decrement affected zero rows: a concurrent caller
    /// took the last slot between selection and reservation. The engine
    /// re-runs selection against current state.
    LostRace,
    /// The user already holds an active slot for this provider.
    AlreadyAssigned,
    /// The originating request left PENDING concurrently (cancelled or
    /// rejected); the drainer skips it.
    RequestNotPending,
}

/// Transactional store over subscriptions, slots, and requests.
#[async_trait]
pub trait SlotStore: Send + Sync + 'static {
    /// Find the user's active slot for a provider, across all of the
    /// provider's subscriptions.
    async fn find_active_slot(
        &self,
        user_id: Uuid,
        service_provider_id: Uuid,
    ) -> AppResult<Option<SubscriptionSlot>>;

    /// All active slots held by a user.
    async fn active_slots_for_user(&self, user_id: Uuid) -> AppResult<Vec<SubscriptionSlot>>;

    /// Eligible subscriptions for a provider (active, spare capacity,
    /// country match when given), ordered per the selection policy.
    async fn find_eligible(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
        policy: SelectionPolicy,
    ) -> AppResult<Vec<Subscription>>;

    /// Look up a subscription by id.
    async fn subscription_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>>;

    /// Atomically reserve one slot on `subscription_id` for `user_id`.
    ///
    /// Within a single transaction: re-check the duplicate-grant
    /// invariant, decrement `available_slots` only if still positive,
    /// insert the slot row, and record the request as ASSIGNED.
    async fn try_reserve(
        &self,
        subscription_id: Uuid,
        user_id: Uuid,
        service_provider_id: Uuid,
        origin: ReserveOrigin,
    ) -> AppResult<ReserveOutcome>;

    /// Create a PENDING request, or return the existing PENDING request
    /// for the same (user, provider, country) if one is already queued.
    async fn create_or_reuse_pending(
        &self,
        user_id: Uuid,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<SubscriptionRequest>;

    /// PENDING requests for a provider in strict FIFO order
    /// (`requested_at` ascending), optionally narrowed to a country.
    async fn pending_requests(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<Vec<SubscriptionRequest>>;

    /// All requests made by a user, newest first.
    async fn requests_for_user(&self, user_id: Uuid) -> AppResult<Vec<SubscriptionRequest>>;

    /// Look up a request by id.
    async fn request_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionRequest>>;

    /// Look up a slot by id.
    async fn slot_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionSlot>>;

    /// Transition a request out of PENDING. Fails with a conflict error
    /// when the request is already terminal.
    async fn transition_request(
        &self,
        request_id: Uuid,
        next: RequestStatus,
    ) -> AppResult<SubscriptionRequest>;

    /// Deactivate a slot and increment its subscription's
    /// `available_slots`, in one transaction. Fails with a conflict error
    /// when the slot is already released.
    async fn release_slot(&self, slot_id: Uuid) -> AppResult<SubscriptionSlot>;
}

/// Read-only catalog lookups used for referential integrity checks.
#[async_trait]
pub trait CatalogReader: Send + Sync + 'static {
    /// Whether the provider exists and is active.
    async fn provider_is_active(&self, service_provider_id: Uuid) -> AppResult<bool>;

    /// Whether the country exists.
    async fn country_exists(&self, country_id: Uuid) -> AppResult<bool>;
}
