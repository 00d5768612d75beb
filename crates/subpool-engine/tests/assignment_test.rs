//! Assignment engine behavior against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use subpool_core::error::ErrorKind;
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
async fn assigns_slot_when_capacity_exists() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let sub = store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);
    let user = Uuid::new_v4();

    let outcome = engine
        .assign_slot_to_user(user, provider, None)
        .await
        .unwrap();

    assert!(outcome.is_assigned());
    let slot = outcome.slot.unwrap();
    assert_eq!(slot.subscription_id, sub);
    assert_eq!(outcome.request.status, RequestStatus::Assigned);
    assert_eq!(outcome.request.assigned_slot_id, Some(slot.id));
    assert!(outcome.request.processed_at.is_some());
    assert_eq!(store.subscription(sub).await.available_slots, 3);
}

#[tokio::test]
async fn rejects_duplicate_grant_for_same_provider() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);
    let user = Uuid::new_v4();

    engine
        .assign_slot_to_user(user, provider, None)
        .await
        .unwrap();
    let err = engine
        .assign_slot_to_user(user, provider, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::AlreadyAssigned);
}

#[tokio::test]
async fn queues_pending_when_no_capacity() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    store
        .add_subscription(provider, None, 2, 0, Utc::now())
        .await;
    let engine = engine_over(&store);
    let user = Uuid::new_v4();

    let outcome = engine
        .assign_slot_to_user(user, provider, None)
        .await
        .unwrap();

    assert!(!outcome.is_assigned());
    assert_eq!(outcome.request.status, RequestStatus::Pending);
    assert!(outcome.request.assigned_slot_id.is_none());
}

#[tokio::test]
async fn reuses_existing_pending_request() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let engine = engine_over(&store);
    let user = Uuid::new_v4();

    let first = engine
        .assign_slot_to_user(user, provider, None)
        .await
        .unwrap();
    let second = engine
        .assign_slot_to_user(user, provider, None)
        .await
        .unwrap();

    assert_eq!(first.request.id, second.request.id);
}

#[tokio::test]
async fn selection_prefers_fullest_then_oldest() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let t1 = Utc::now();
    let t2 = t1 - Duration::hours(1);
    // A is nearly full but newer; B is emptier but older.
    let a = store.add_subscription(provider, None, 4, 1, t1).await;
    let b = store.add_subscription(provider, None, 4, 3, t2).await;
    let engine = engine_over(&store);

    let first = engine
        .assign_slot_to_user(Uuid::new_v4(), provider, None)
        .await
        .unwrap();
    assert_eq!(first.slot.unwrap().subscription_id, a);

    // A is now full; the next grant lands on B.
    let second = engine
        .assign_slot_to_user(Uuid::new_v4(), provider, None)
        .await
        .unwrap();
    assert_eq!(second.slot.unwrap().subscription_id, b);
    assert_eq!(store.subscription(a).await.available_slots, 0);
}

#[tokio::test]
async fn country_scope_narrows_eligibility() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let country = store.add_country().await;
    let other = store.add_country().await;
    store
        .add_subscription(provider, Some(other), 4, 4, Utc::now())
        .await;
    let scoped = store
        .add_subscription(provider, Some(country), 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);

    let outcome = engine
        .assign_slot_to_user(Uuid::new_v4(), provider, Some(country))
        .await
        .unwrap();

    assert_eq!(outcome.slot.unwrap().subscription_id, scoped);
}

#[tokio::test]
async fn unscoped_request_accepts_any_country() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let country = store.add_country().await;
    let scoped = store
        .add_subscription(provider, Some(country), 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);

    let outcome = engine
        .assign_slot_to_user(Uuid::new_v4(), provider, None)
        .await
        .unwrap();

    assert_eq!(outcome.slot.unwrap().subscription_id, scoped);
}

#[tokio::test]
async fn unknown_provider_and_country_are_not_found() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);

    let err = engine
        .assign_slot_to_user(Uuid::new_v4(), Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = engine
        .assign_slot_to_user(Uuid::new_v4(), provider, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn inactive_provider_is_invisible() {
    let store = MemoryStore::new();
    let provider = store.add_inactive_provider().await;
    store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);

    let err = engine
        .assign_slot_to_user(Uuid::new_v4(), provider, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn inactive_subscription_is_skipped() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let inactive = store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    store.deactivate_subscription(inactive).await;
    let engine = engine_over(&store);

    let outcome = engine
        .assign_slot_to_user(Uuid::new_v4(), provider, None)
        .await
        .unwrap();
    assert!(!outcome.is_assigned());
}

#[tokio::test]
async fn capacity_invariant_holds_after_assignments() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let sub = store
        .add_subscription(provider, None, 5, 5, Utc::now())
        .await;
    let engine = engine_over(&store);

    for _ in 0..3 {
        engine
            .assign_slot_to_user(Uuid::new_v4(), provider, None)
            .await
            .unwrap();
    }

    let snapshot = store.subscription(sub).await;
    let active = store.active_slot_count(sub).await as i32;
    assert!(snapshot.available_slots >= 0);
    assert_eq!(snapshot.available_slots + active, snapshot.total_slots);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_never_over_allocate() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let sub = store
        .add_subscription(provider, None, 3, 3, Utc::now())
        .await;
    let engine = engine_over(&store);

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .assign_slot_to_user(Uuid::new_v4(), provider, None)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut assigned = 0;
    let mut pending = 0;
    for task in tasks {
        let outcome = task.await.unwrap();
        if outcome.is_assigned() {
            assigned += 1;
        } else {
            pending += 1;
        }
    }

    assert_eq!(assigned, 3);
    assert_eq!(pending, 7);
    let snapshot = store.subscription(sub).await;
    assert_eq!(snapshot.available_slots, 0);
    assert_eq!(store.active_slot_count(sub).await, 3);
}

#[tokio::test]
async fn find_available_slot_does_not_mutate() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let sub = store
        .add_subscription(provider, None, 4, 2, Utc::now())
        .await;
    let engine = engine_over(&store);

    let probe = engine.find_available_slot(provider, None).await.unwrap();
    assert_eq!(probe.unwrap().id, sub);
    assert_eq!(store.subscription(sub).await.available_slots, 2);
}

#[tokio::test]
async fn validate_slot_assignment_checks_capacity_and_activity() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    let with_room = store
        .add_subscription(provider, None, 4, 1, Utc::now())
        .await;
    let full = store
        .add_subscription(provider, None, 4, 0, Utc::now())
        .await;
    let engine = engine_over(&store);

    assert!(engine.validate_slot_assignment(with_room).await.unwrap());
    assert!(!engine.validate_slot_assignment(full).await.unwrap());
    assert!(
        !engine
            .validate_slot_assignment(Uuid::new_v4())
            .await
            .unwrap()
    );

    store.deactivate_subscription(with_room).await;
    assert!(!engine.validate_slot_assignment(with_room).await.unwrap());
}

#[tokio::test]
async fn release_requires_ownership_and_active_slot() {
    let store = MemoryStore::new();
    let provider = store.add_provider().await;
    store
        .add_subscription(provider, None, 4, 4, Utc::now())
        .await;
    let engine = engine_over(&store);
    let owner = Uuid::new_v4();

    let outcome = engine
        .assign_slot_to_user(owner, provider, None)
        .await
        .unwrap();
    let slot_id = outcome.slot.unwrap().id;

    let err = engine
        .release_slot(Uuid::new_v4(), slot_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    engine.release_slot(owner, slot_id).await.unwrap();
    let err = engine.release_slot(owner, slot_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}
