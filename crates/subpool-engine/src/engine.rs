//! The slot assignment engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use subpool_core::config::engine::EngineConfig;
use subpool_core::{AppError, AppResult};
use subpool_entity::request::{RequestStatus, SubscriptionRequest};
use subpool_entity::slot::SubscriptionSlot;
use subpool_entity::subscription::Subscription;

use crate::policy::SelectionPolicy;
use crate::store::{CatalogReader, ReserveOrigin, ReserveOutcome, SlotStore};

/// Result of an assignment call.
///
/// A pending outcome is a success, not an error: the request is queued
/// and will be drained when capacity frees up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    /// The request row recording the ask (ASSIGNED or PENDING).
    pub request: SubscriptionRequest,
    /// The granted slot, when one was reserved.
    pub slot: Option<SubscriptionSlot>,
}

impl AssignmentOutcome {
    /// Whether a slot was actually granted.
    pub fn is_assigned(&self) -> bool {
        self.slot.is_some()
    }

    /// Human-readable outcome summary for API responses.
    pub fn message(&self) -> &'static str {
        if self.is_assigned() {
            "Slot assigned"
        } else {
            "No capacity available; request queued as pending"
        }
    }
}

/// Orchestrates slot assignment across the subscription, slot, and
/// request stores.
///
/// The engine owns no data: every mutation happens inside the store's
/// reservation transaction, so two concurrent calls can never decrement
/// a subscription below zero. A lost race is retried against current
/// state up to `max_reserve_attempts` times before the call degrades to
/// creating a PENDING request.
#[derive(Clone)]
pub struct SlotAssignmentEngine {
    /// Transactional store over the three tables.
    pub(crate) store: Arc<dyn SlotStore>,
    /// Catalog lookups for referential integrity.
    catalog: Arc<dyn CatalogReader>,
    /// Candidate ordering policy.
    pub(crate) policy: SelectionPolicy,
    /// Bounded internal retries for lost reservation races.
    pub(crate) max_reserve_attempts: u32,
}

impl SlotAssignmentEngine {
    /// Build an engine from configuration.
    pub fn from_config(
        store: Arc<dyn SlotStore>,
        catalog: Arc<dyn CatalogReader>,
        config: &EngineConfig,
    ) -> AppResult<Self> {
        let policy: SelectionPolicy = config.selection_policy.parse()?;
        Ok(Self::new(
            store,
            catalog,
            policy,
            config.max_reserve_attempts,
        ))
    }

    /// Build an engine with an explicit policy.
    pub fn new(
        store: Arc<dyn SlotStore>,
        catalog: Arc<dyn CatalogReader>,
        policy: SelectionPolicy,
        max_reserve_attempts: u32,
    ) -> Self {
        Self {
            store,
            catalog,
            policy,
            max_reserve_attempts: max_reserve_attempts.max(1),
        }
    }

    /// The active selection policy.
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<dyn SlotStore> {
        &self.store
    }

    /// Assign the user a slot for the provider, or queue a PENDING
    /// request when no eligible subscription has capacity.
    ///
    /// Fails with `AlreadyAssigned` when the user already holds an
    /// active slot for this provider, and with `NotFound` when the
    /// provider or country does not exist.
    pub async fn assign_slot_to_user(
        &self,
        user_id: Uuid,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<AssignmentOutcome> {
        self.check_references(service_provider_id, country_id)
            .await?;

        if self
            .store
            .find_active_slot(user_id, service_provider_id)
            .await?
            .is_some()
        {
            return Err(AppError::already_assigned(
                "User already holds an active slot for this service provider",
            ));
        }

        for attempt in 1..=self.max_reserve_attempts {
            let candidates = self
                .store
                .find_eligible(service_provider_id, country_id, self.policy)
                .await?;
            let Some(best) = candidates.first() else {
                break;
            };

            match self
                .store
                .try_reserve(
                    best.id,
                    user_id,
                    service_provider_id,
                    ReserveOrigin::Direct { country_id },
                )
                .await?
            {
                ReserveOutcome::Reserved { slot, request } => {
                    info!(
                        user_id = %user_id,
                        subscription_id = %best.id,
                        slot_id = %slot.id,
                        attempt,
                        "Slot assigned"
                    );
                    return Ok(AssignmentOutcome {
                        request,
                        slot: Some(slot),
                    });
                }
                ReserveOutcome::LostRace => {
                    debug!(
                        user_id = %user_id,
                        subscription_id = %best.id,
                        attempt,
                        "Lost reservation race, re-selecting"
                    );
                    continue;
                }
                ReserveOutcome::AlreadyAssigned => {
                    return Err(AppError::already_assigned(
                        "User already holds an active slot for this service provider",
                    ));
                }
                ReserveOutcome::RequestNotPending => {
                    // Direct reservations carry no pre-existing request.
                    return Err(AppError::internal(
                        "Reservation reported a stale request for a direct call",
                    ));
                }
            }
        }

        let request = self
            .store
            .create_or_reuse_pending(user_id, service_provider_id, country_id)
            .await?;
        info!(
            user_id = %user_id,
            service_provider_id = %service_provider_id,
            request_id = %request.id,
            "No capacity available, request queued as pending"
        );
        Ok(AssignmentOutcome {
            request,
            slot: None,
        })
    }

    /// Read-only probe: the subscription the engine would pick right now,
    /// without mutating anything.
    pub async fn find_available_slot(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<Option<Subscription>> {
        self.check_references(service_provider_id, country_id)
            .await?;
        let candidates = self
            .store
            .find_eligible(service_provider_id, country_id, self.policy)
            .await?;
        Ok(candidates.into_iter().next())
    }

    /// Whether a subscription currently has spare, active capacity.
    pub async fn validate_slot_assignment(&self, subscription_id: Uuid) -> AppResult<bool> {
        Ok(self
            .store
            .subscription_by_id(subscription_id)
            .await?
            .map(|s| s.has_capacity())
            .unwrap_or(false))
    }

    /// Release a slot held by `user_id`, then drain pending requests for
    /// the freed provider.
    pub async fn release_slot(
        &self,
        user_id: Uuid,
        slot_id: Uuid,
    ) -> AppResult<SubscriptionSlot> {
        let slot = self
            .store
            .slot_by_id(slot_id)
            .await?
            .ok_or_else(|| AppError::not_found("Slot not found"))?;
        if slot.user_id != user_id {
            return Err(AppError::authorization("Slot belongs to another user"));
        }
        if !slot.is_active {
            return Err(AppError::conflict("Slot is already released"));
        }

        let released = self.store.release_slot(slot_id).await?;

        let provider_id = self
            .store
            .subscription_by_id(released.subscription_id)
            .await?
            .map(|s| s.service_provider_id);
        if let Some(provider_id) = provider_id {
            let report = self.drain_pending(provider_id, None).await?;
            info!(
                slot_id = %slot_id,
                service_provider_id = %provider_id,
                assigned = report.assigned,
                "Slot released, pending requests drained"
            );
        } else {
            warn!(slot_id = %slot_id, "Released slot references a missing subscription");
        }

        Ok(released)
    }

    /// Cancel a PENDING request on behalf of its owner.
    pub async fn cancel_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> AppResult<SubscriptionRequest> {
        let request = self
            .store
            .request_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Request not found"))?;
        if request.user_id != user_id {
            return Err(AppError::authorization("Request belongs to another user"));
        }
        self.store
            .transition_request(request_id, RequestStatus::Cancelled)
            .await
    }

    /// Reject a PENDING request (administrative decision).
    pub async fn reject_request(&self, request_id: Uuid) -> AppResult<SubscriptionRequest> {
        self.store
            .request_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Request not found"))?;
        self.store
            .transition_request(request_id, RequestStatus::Rejected)
            .await
    }

    /// Verify provider and country references against the catalog.
    async fn check_references(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<()> {
        if !self.catalog.provider_is_active(service_provider_id).await? {
            return Err(AppError::not_found("Service provider not found"));
        }
        if let Some(country_id) = country_id
            && !self.catalog.country_exists(country_id).await?
        {
            return Err(AppError::not_found("Country not found"));
        }
        Ok(())
    }
}
