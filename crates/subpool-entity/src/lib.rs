//! # subpool-entity
//!
//! Domain entity models for SubPool: the user directory, catalog reference
//! data, and the three stores of the slot assignment subsystem
//! (subscriptions, slots, requests).

pub mod catalog;
pub mod request;
pub mod slot;
pub mod subscription;
pub mod user;
