//! # subpool-database
//!
//! PostgreSQL persistence for SubPool: the connection pool wrapper,
//! the migration runner, repositories for users and catalog data, and
//! the transactional Postgres implementation of the engine's
//! [`SlotStore`](subpool_engine::SlotStore) seam.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::PgSlotStore;
