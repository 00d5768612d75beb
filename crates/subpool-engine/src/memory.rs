//! In-memory store using a Tokio mutex for single-node use.
//!
//! Every trait method takes the one lock, so a reservation is atomic by
//! construction, mirroring the transactional guarantees of the Postgres
//! store. Suitable for tests and single-node development only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use subpool_core::{AppError, AppResult};
use subpool_entity::request::{RequestStatus, SubscriptionRequest};
use subpool_entity::slot::SubscriptionSlot;
use subpool_entity::subscription::Subscription;

use crate::policy::SelectionPolicy;
use crate::store::{CatalogReader, ReserveOrigin, ReserveOutcome, SlotStore};

/// Internal state behind the mutex.
#[derive(Debug, Default)]
struct Inner {
    /// provider id -> is_active
    providers: HashMap<Uuid, bool>,
    countries: HashMap<Uuid, ()>,
    subscriptions: HashMap<Uuid, Subscription>,
    slots: HashMap<Uuid, SubscriptionSlot>,
    requests: HashMap<Uuid, SubscriptionRequest>,
}

impl Inner {
    fn provider_of(&self, subscription_id: Uuid) -> Option<Uuid> {
        self.subscriptions
            .get(&subscription_id)
            .map(|s| s.service_provider_id)
    }

    fn user_active_slot(&self, user_id: Uuid, service_provider_id: Uuid) -> Option<&SubscriptionSlot> {
        self.slots.values().find(|slot| {
            slot.is_active
                && slot.user_id == user_id
                && self.provider_of(slot.subscription_id) == Some(service_provider_id)
        })
    }
}

/// In-memory implementation of [`SlotStore`] and [`CatalogReader`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active service provider.
    pub async fn add_provider(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().await.providers.insert(id, true);
        id
    }

    /// Register an inactive service provider.
    pub async fn add_inactive_provider(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().await.providers.insert(id, false);
        id
    }

    /// Register a country.
    pub async fn add_country(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().await.countries.insert(id, ());
        id
    }

    /// Register a subscription account with explicit capacity and age.
    pub async fn add_subscription(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
        total_slots: i32,
        available_slots: i32,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let subscription = Subscription {
            id,
            service_provider_id,
            country_id,
            name: format!("subscription-{id}"),
            email: format!("{id}@subpool.test"),
            password_hash: "unused".to_string(),
            available_slots,
            total_slots,
            user_price: None,
            currency_id: None,
            renewal_info: None,
            metadata: None,
            expires_at: None,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        self.state.lock().await.subscriptions.insert(id, subscription);
        id
    }

    /// Deactivate a subscription, hiding it from the engine.
    pub async fn deactivate_subscription(&self, id: Uuid) {
        if let Some(s) = self.state.lock().await.subscriptions.get_mut(&id) {
            s.is_active = false;
        }
    }

    /// Queue a PENDING request with an explicit `requested_at`, for
    /// exercising FIFO draining.
    pub async fn queue_pending(
        &self,
        user_id: Uuid,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
        requested_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let request = SubscriptionRequest {
            id,
            user_id,
            service_provider_id,
            country_id,
            status: RequestStatus::Pending,
            assigned_slot_id: None,
            requested_at,
            processed_at: None,
            metadata: None,
            created_at: requested_at,
            updated_at: requested_at,
        };
        self.state.lock().await.requests.insert(id, request);
        id
    }

    /// Snapshot a subscription (panics if absent; test helper).
    pub async fn subscription(&self, id: Uuid) -> Subscription {
        self.state.lock().await.subscriptions[&id].clone()
    }

    /// Snapshot a request (panics if absent; test helper).
    pub async fn request(&self, id: Uuid) -> SubscriptionRequest {
        self.state.lock().await.requests[&id].clone()
    }

    /// Count active slots on a subscription.
    pub async fn active_slot_count(&self, subscription_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .slots
            .values()
            .filter(|s| s.is_active && s.subscription_id == subscription_id)
            .count()
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn find_active_slot(
        &self,
        user_id: Uuid,
        service_provider_id: Uuid,
    ) -> AppResult<Option<SubscriptionSlot>> {
        let state = self.state.lock().await;
        Ok(state.user_active_slot(user_id, service_provider_id).cloned())
    }

    async fn active_slots_for_user(&self, user_id: Uuid) -> AppResult<Vec<SubscriptionSlot>> {
        let state = self.state.lock().await;
        let mut slots: Vec<_> = state
            .slots
            .values()
            .filter(|s| s.is_active && s.user_id == user_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.assigned_at);
        Ok(slots)
    }

    async fn find_eligible(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
        policy: SelectionPolicy,
    ) -> AppResult<Vec<Subscription>> {
        let state = self.state.lock().await;
        let mut candidates: Vec<_> = state
            .subscriptions
            .values()
            .filter(|s| {
                s.service_provider_id == service_provider_id
                    && s.has_capacity()
                    && country_id.is_none_or(|c| s.country_id == Some(c))
            })
            .cloned()
            .collect();
        policy.sort(&mut candidates);
        Ok(candidates)
    }

    async fn subscription_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.state.lock().await.subscriptions.get(&id).cloned())
    }

    async fn try_reserve(
        &self,
        subscription_id: Uuid,
        user_id: Uuid,
        service_provider_id: Uuid,
        origin: ReserveOrigin,
    ) -> AppResult<ReserveOutcome> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if state.user_active_slot(user_id, service_provider_id).is_some() {
            return Ok(ReserveOutcome::AlreadyAssigned);
        }

        if let ReserveOrigin::Request(request_id) = origin {
            let request = state
                .requests
                .get(&request_id)
                .ok_or_else(|| AppError::not_found("Request not found"))?;
            if request.status != RequestStatus::Pending {
                return Ok(ReserveOutcome::RequestNotPending);
            }
        }

        let Some(subscription) = state.subscriptions.get_mut(&subscription_id) else {
            return Err(AppError::not_found("Subscription not found"));
        };
        if !subscription.has_capacity() {
            return Ok(ReserveOutcome::LostRace);
        }
        subscription.available_slots -= 1;
        subscription.updated_at = now;

        let slot = SubscriptionSlot {
            id: Uuid::new_v4(),
            user_id,
            subscription_id,
            is_active: true,
            assigned_at: now,
            released_at: None,
            created_at: now,
        };
        state.slots.insert(slot.id, slot.clone());

        let request = match origin {
            ReserveOrigin::Request(request_id) => {
                let request = state
                    .requests
                    .get_mut(&request_id)
                    .ok_or_else(|| AppError::not_found("Request not found"))?;
                request.status = RequestStatus::Assigned;
                request.assigned_slot_id = Some(slot.id);
                request.processed_at = Some(now);
                request.updated_at = now;
                request.clone()
            }
            ReserveOrigin::Direct { country_id } => {
                let request = SubscriptionRequest {
                    id: Uuid::new_v4(),
                    user_id,
                    service_provider_id,
                    country_id,
                    status: RequestStatus::Assigned,
                    assigned_slot_id: Some(slot.id),
                    requested_at: now,
                    processed_at: Some(now),
                    metadata: None,
                    created_at: now,
                    updated_at: now,
                };
                state.requests.insert(request.id, request.clone());
                request
            }
        };

        Ok(ReserveOutcome::Reserved { slot, request })
    }

    async fn create_or_reuse_pending(
        &self,
        user_id: Uuid,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<SubscriptionRequest> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.requests.values().find(|r| {
            r.status == RequestStatus::Pending
                && r.user_id == user_id
                && r.service_provider_id == service_provider_id
                && r.country_id == country_id
        }) {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let request = SubscriptionRequest {
            id: Uuid::new_v4(),
            user_id,
            service_provider_id,
            country_id,
            status: RequestStatus::Pending,
            assigned_slot_id: None,
            requested_at: now,
            processed_at: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        };
        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn pending_requests(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<Vec<SubscriptionRequest>> {
        let state = self.state.lock().await;
        let mut pending: Vec<_> = state
            .requests
            .values()
            .filter(|r| {
                r.status == RequestStatus::Pending
                    && r.service_provider_id == service_provider_id
                    && country_id.is_none_or(|c| r.country_id == Some(c))
            })
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.requested_at);
        Ok(pending)
    }

    async fn requests_for_user(&self, user_id: Uuid) -> AppResult<Vec<SubscriptionRequest>> {
        let state = self.state.lock().await;
        let mut requests: Vec<_> = state
            .requests
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }

    async fn request_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionRequest>> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn slot_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionSlot>> {
        Ok(self.state.lock().await.slots.get(&id).cloned())
    }

    async fn transition_request(
        &self,
        request_id: Uuid,
        next: RequestStatus,
    ) -> AppResult<SubscriptionRequest> {
        let mut state = self.state.lock().await;
        let request = state
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| AppError::not_found("Request not found"))?;
        if !request.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Request is {} and cannot become {next}",
                request.status
            )));
        }
        let now = Utc::now();
        request.status = next;
        request.processed_at = Some(now);
        request.updated_at = now;
        Ok(request.clone())
    }

    async fn release_slot(&self, slot_id: Uuid) -> AppResult<SubscriptionSlot> {
        let mut state = self.state.lock().await;
        let slot = state
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| AppError::not_found("Slot not found"))?;
        if !slot.is_active {
            return Err(AppError::conflict("Slot is already released"));
        }
        let now = Utc::now();
        slot.is_active = false;
        slot.released_at = Some(now);
        let subscription_id = slot.subscription_id;
        let released = slot.clone();

        if let Some(subscription) = state.subscriptions.get_mut(&subscription_id) {
            subscription.available_slots += 1;
            subscription.updated_at = now;
        }
        Ok(released)
    }
}

#[async_trait]
impl CatalogReader for MemoryStore {
    async fn provider_is_active(&self, service_provider_id: Uuid) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .providers
            .get(&service_provider_id)
            .copied()
            .unwrap_or(false))
    }

    async fn country_exists(&self, country_id: Uuid) -> AppResult<bool> {
        Ok(self.state.lock().await.countries.contains_key(&country_id))
    }
}
