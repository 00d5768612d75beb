//! Pending request drainer behavior against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use subpool_engine::memory::MemoryStore;
use subpool_engine::{SelectionPolicy, SlotAssignmentEngine};
use subpool_entity::request::RequestStatus;

fn engine_over(store: &MemoryStore) -> SlotAssignmentEngine {
    let store = Arc::new(store.clone());
    SlotAssignmentEngine::new(
        store.clone(),
        store,
        SelectionPolicy::FewestAvailableFirst,
        3,
    )
}

#[tokio::test]
async fn drains_fifo_up_to_available_capacity() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let base = Utc::now();
    let r1 = store
        .queue_pending(Uuid::new_v4(), provider, None, base)
        .await;
    let r2 = store
        .queue_pending(Uuid::new_v4(), provider, None, base + Duration::seconds(1))
        .await;
    let r3 = store
        .queue_pending(Uuid::new_v4(), provider, None, base + Duration::seconds(2))
        .await;
    // Exactly one unit of capacity.
    store
        .add_subscription(provider, None, 4, 1, Utc::now())
        .await;
    let engine = engine_over(&store);

    let report = engine.drain_pending(provider, None).await.unwrap();

    assert_eq!(report.assigned, 1);
    assert_eq!(report.remaining_pending, 2);
    assert_eq!(store.request(r1).await.status, RequestStatus::Assigned);
    assert!(store.request(r1).await.assigned_slot_id.is_some());
    assert_eq!(store.request(r2).await.status, RequestStatus::Pending);
    assert_eq!(store.request(r3).await.status, RequestStatus::Pending);
}

#[tokio::test]
async fn drain_consumes_one_unit_per_request() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let base = Utc::now();
    for i in 0..3 {
        store
            .queue_pending(
                Uuid::new_v4(),
                provider,
                None,
                base + Duration::seconds(i),
            )
            .await;
    }
    let sub = store
        .add_subscription(provider, None, 4, 2, Utc::now())
        .await;
    let engine = engine_over(&store);

    let report = engine.drain_pending(provider, None).await.unwrap();

    assert_eq!(report.assigned, 2);
    assert_eq!(report.remaining_pending, 1);
    let snapshot = store.subscription(sub).await;
    assert_eq!(snapshot.available_slots, 0);
    assert_eq!(store.active_slot_count(sub).await, 2);
}

#[tokio::test]
async fn drain_is_idempotent_without_new_capacity() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let base = Utc::now();
    let queued = store
        .queue_pending(Uuid::new_v4(), provider, None, base)
        .await;
    store
        .add_subscription(provider, None, 2, 0, Utc::now())
        .await;
    let engine = engine_over(&store);

    let first = engine.drain_pending(provider, None).await.unwrap();
    let second = engine.drain_pending(provider, None).await.unwrap();

    assert_eq!(first.assigned, 0);
    assert_eq!(second.assigned, 0);
    assert_eq!(second.remaining_pending, 1);
    assert_eq!(store.request(queued).await.status, RequestStatus::Pending);
}

#[tokio::test]
async fn drain_skips_cancelled_and_rejected_requests() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let base = Utc::now();
    let user = Uuid::new_v4();
    let cancelled = store.queue_pending(user, provider, None, base).await;
    let rejected = store
        .queue_pending(Uuid::new_v4(), provider, None, base + Duration::seconds(1))
        .await;
    let live = store
        .queue_pending(Uuid::new_v4(), provider, None, base + Duration::seconds(2))
        .await;
    store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);

    engine.cancel_request(user, cancelled).await.unwrap();
    engine.reject_request(rejected).await.unwrap();

    let report = engine.drain_pending(provider, None).await.unwrap();

    assert_eq!(report.assigned, 1);
    assert_eq!(store.request(live).await.status, RequestStatus::Assigned);
    assert_eq!(
        store.request(cancelled).await.status,
        RequestStatus::Cancelled
    );
    assert_eq!(store.request(rejected).await.status, RequestStatus::Rejected);
}

#[tokio::test]
async fn terminal_requests_never_transition_again() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let user = Uuid::new_v4();
    let request = store
        .queue_pending(user, provider, None, Utc::now())
        .await;
    let engine = engine_over(&store);

    engine.cancel_request(user, request).await.unwrap();
    let err = engine.cancel_request(user, request).await.unwrap_err();
    assert_eq!(err.kind, subpool_core::error::ErrorKind::Conflict);
    let err = engine.reject_request(request).await.unwrap_err();
    assert_eq!(err.kind, subpool_core::error::ErrorKind::Conflict);
}

#[tokio::test]
async fn drain_skips_users_who_gained_slots_elsewhere() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let user = Uuid::new_v4();
    let base = Utc::now();
    let stale = store.queue_pending(user, provider, None, base).await;
    store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);

    // The user obtained a slot directly after queueing.
    engine
        .assign_slot_to_user(user, provider, None)
        .await
        .unwrap();

    let report = engine.drain_pending(provider, None).await.unwrap();
    assert_eq!(report.assigned, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(store.request(stale).await.status, RequestStatus::Pending);
}

#[tokio::test]
async fn release_triggers_drain_of_oldest_pending() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let sub = store
        .add_subscription(provider, None, 1, 1, Utc::now())
        .await;
    let engine = engine_over(&store);

    // First member takes the only slot.
    let holder = Uuid::new_v4();
    let granted = engine
        .assign_slot_to_user(holder, provider, None)
        .await
        .unwrap();

    // A second user asks and is queued.
    let waiter = Uuid::new_v4();
    let queued = engine
        .assign_slot_to_user(waiter, provider, None)
        .await
        .unwrap();
    assert_eq!(queued.request.status, RequestStatus::Pending);

    // Releasing frees one unit and the drainer hands it to the waiter.
    engine
        .release_slot(holder, granted.slot.unwrap().id)
        .await
        .unwrap();

    let drained = store.request(queued.request.id).await;
    assert_eq!(drained.status, RequestStatus::Assigned);
    assert!(drained.assigned_slot_id.is_some());
    assert_eq!(store.subscription(sub).await.available_slots, 0);
}

#[tokio::test]
async fn country_scoped_requests_drain_against_their_own_scope() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let country = store.add_country().await;
    let base = Utc::now();
    // Oldest request wants a country with no capacity; a younger
    // unscoped request can still be served.
    let scoped = store
        .queue_pending(Uuid::new_v4(), provider, Some(country), base)
        .await;
    let unscoped = store
        .queue_pending(Uuid::new_v4(), provider, None, base + Duration::seconds(1))
        .await;
    store
        .add_subscription(provider, None, 4, 1, Utc::now())
        .await;
    let engine = engine_over(&store);

    let report = engine.drain_pending(provider, None).await.unwrap();

    assert_eq!(report.assigned, 1);
    assert_eq!(report.remaining_pending, 1);
    assert_eq!(store.request(scoped).await.status, RequestStatus::Pending);
    assert_eq!(store.request(unscoped).await.status, RequestStatus::Assigned);
}

#[tokio::test]
async fn pending_then_capacity_freed_scenario() {
    // Subscription S has no free slots; U's ask queues; a release frees
    // one unit; the drainer assigns U and capacity returns to zero.
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let sub = store
        .add_subscription(provider, None, 1, 1, Utc::now())
        .await;
    let engine = engine_over(&store);

    let holder = Uuid::new_v4();
    let held = engine
        .assign_slot_to_user(holder, provider, None)
        .await
        .unwrap();
    assert_eq!(store.subscription(sub).await.available_slots, 0);

    let user = Uuid::new_v4();
    let queued = engine
        .assign_slot_to_user(user, provider, None)
        .await
        .unwrap();
    assert_eq!(queued.request.status, RequestStatus::Pending);

    engine
        .release_slot(holder, held.slot.unwrap().id)
        .await
        .unwrap();

    let after = store.request(queued.request.id).await;
    assert_eq!(after.status, RequestStatus::Assigned);
    assert!(after.assigned_slot_id.is_some());
    assert!(after.processed_at.is_some());
    assert_eq!(store.subscription(sub).await.available_slots, 0);
}
