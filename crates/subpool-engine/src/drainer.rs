//! Pending request drainer.
//!
//! Re-attempts queued PENDING requests in strict FIFO order whenever
//! capacity frees up (a subscription is registered or a slot is
//! released). Capacity is re-checked on every iteration, never taken
//! from a stale snapshot, and one failed request never aborts the batch.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use subpool_core::AppResult;

use crate::engine::SlotAssignmentEngine;
use crate::store::{ReserveOrigin, ReserveOutcome};

/// Summary of one drain pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrainReport {
    /// Requests transitioned PENDING → ASSIGNED.
    pub assigned: u32,
    /// Requests skipped: owner already holds a slot, or the request
    /// turned terminal concurrently.
    pub skipped: u32,
    /// Requests whose attempt hit a storage error; they stay PENDING and
    /// are retried on the next trigger.
    pub failed: u32,
    /// Requests left PENDING because no eligible capacity remained.
    pub remaining_pending: u32,
}

impl SlotAssignmentEngine {
    /// Drain PENDING requests for a provider against currently available
    /// capacity, first-asked first-served.
    ///
    /// `country_id` narrows which queued requests are considered; each
    /// request is matched against capacity in its own country scope.
    pub async fn drain_pending(
        &self,
        service_provider_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<DrainReport> {
        let pending = self
            .store
            .pending_requests(service_provider_id, country_id)
            .await?;
        let total = pending.len();
        let mut report = DrainReport::default();

        for (index, request) in pending.iter().enumerate() {
            // A queued user may have gained a slot since asking (e.g. via
            // a direct call); their request is skipped, not re-granted.
            match self
                .store
                .find_active_slot(request.user_id, service_provider_id)
                .await
            {
                Ok(Some(_)) => {
                    report.skipped += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        request_id = %request.id,
                        error = %e,
                        "Drain attempt failed, request stays pending"
                    );
                    report.failed += 1;
                    continue;
                }
            }

            match self.drain_one(service_provider_id, request.id, request.user_id, request.country_id).await {
                Ok(DrainStep::Assigned) => report.assigned += 1,
                Ok(DrainStep::Skipped) => report.skipped += 1,
                Ok(DrainStep::NoCapacityInScope) => {
                    if request.country_id.is_none() {
                        // An unscoped request matches every subscription of
                        // the provider; nothing can satisfy later requests
                        // either once global capacity is gone.
                        report.remaining_pending += (total - index) as u32;
                        break;
                    }
                    report.remaining_pending += 1;
                }
                Err(e) => {
                    warn!(
                        request_id = %request.id,
                        error = %e,
                        "Drain attempt failed, request stays pending"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            service_provider_id = %service_provider_id,
            total,
            assigned = report.assigned,
            skipped = report.skipped,
            failed = report.failed,
            remaining = report.remaining_pending,
            "Drain pass complete"
        );
        Ok(report)
    }

    /// Attempt one request with bounded race retries.
    async fn drain_one(
        &self,
        service_provider_id: Uuid,
        request_id: Uuid,
        user_id: Uuid,
        country_id: Option<Uuid>,
    ) -> AppResult<DrainStep> {
        for _attempt in 1..=self.max_reserve_attempts {
            let candidates = self
                .store
                .find_eligible(service_provider_id, country_id, self.policy)
                .await?;
            let Some(best) = candidates.first() else {
                return Ok(DrainStep::NoCapacityInScope);
            };

            match self
                .store
                .try_reserve(
                    best.id,
                    user_id,
                    service_provider_id,
                    ReserveOrigin::Request(request_id),
                )
                .await?
            {
                ReserveOutcome::Reserved { .. } => return Ok(DrainStep::Assigned),
                ReserveOutcome::LostRace => continue,
                ReserveOutcome::AlreadyAssigned | ReserveOutcome::RequestNotPending => {
                    return Ok(DrainStep::Skipped);
                }
            }
        }
        // Retries exhausted under contention; the request stays pending.
        Ok(DrainStep::NoCapacityInScope)
    }
}

/// Outcome of draining a single request.
enum DrainStep {
    Assigned,
    Skipped,
    NoCapacityInScope,
}
