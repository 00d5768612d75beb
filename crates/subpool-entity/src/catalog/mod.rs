//! Catalog reference data: service providers, countries, currencies.
//!
//! Read-only from the engine's perspective; only existence checks feed
//! into assignment decisions.

pub mod country;
pub mod currency;
pub mod provider;

pub use country::Country;
pub use currency::Currency;
pub use provider::ServiceProvider;
