//! Subscription slot entities.

pub mod model;

pub use model::SubscriptionSlot;
