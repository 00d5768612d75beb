//! Subscription request entities.

pub mod model;
pub mod status;

pub use model::SubscriptionRequest;
pub use status::RequestStatus;
