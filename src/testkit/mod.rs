//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`records`] - Builders for trade records with explicit timestamps.
//! - [`store`] - [`FlakyStore`], a failure-injecting store wrapper.
//! - [`notify`] - [`CollectingNotifier`], captures notices for assertion.

pub mod notify;
pub mod records;
pub mod store;

pub use notify::CollectingNotifier;
pub use records::{buy, sell, yield_claim};
pub use store::FlakyStore;
