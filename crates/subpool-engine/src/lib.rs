//! # subpool-engine
//!
//! The slot assignment subsystem: given a pool of subscription accounts
//! with fixed capacity and a stream of user requests, deterministically
//! assign users to accounts with spare capacity or queue them as pending,
//! without ever over-allocating a subscription's slots.
//!
//! The engine coordinates three stores (subscriptions, slots, requests)
//! behind the [`store::SlotStore`] seam. Two implementations exist: the
//! Postgres store in `subpool-database` (transactional, conditional
//! decrement) and the in-memory store in [`memory`] (single tokio mutex),
//! used for tests and single-node development.

pub mod drainer;
pub mod engine;
pub mod memory;
pub mod policy;
pub mod store;

pub use drainer::DrainReport;
pub use engine::{AssignmentOutcome, SlotAssignmentEngine};
pub use policy::SelectionPolicy;
pub use store::{CatalogReader, ReserveOrigin, ReserveOutcome, SlotStore};
