//! HTTP request handlers, organized by domain.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod subscription;
