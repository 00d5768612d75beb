//! Request and response DTOs.
//!
//! All wire-facing JSON uses camelCase field names.

pub mod request;
pub mod response;
