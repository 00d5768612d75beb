//! Shared subscription account entities.

pub mod model;

pub use model::{CreateSubscription, Subscription};
