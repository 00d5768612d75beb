//! Repository implementations over the PostgreSQL pool.

pub mod catalog;
pub mod subscription;
pub mod user;

pub use catalog::CatalogRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
