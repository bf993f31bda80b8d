//! BondFi ledger - client-side transaction history synchronization.
//!
//! This crate implements the trade-history core of the BondFi tokenized
//! treasury demo: an ordered, capped, per-owner collection of trade
//! records kept eventually consistent with an external Record Store
//! through a bulk fetch plus a realtime change stream, with aggregate
//! derivations over the cached window.
//!
//! # Architecture
//!
//! The store and the notification sink sit behind ports so the core
//! never depends on a concrete backend:
//!
//! - **`port::store`** - [`RecordStore`](port::RecordStore), the
//!   persistence + change-notification contract
//! - **`port::notifier`** - [`Notifier`](port::Notifier), user-visible
//!   notifications (toasts, in the original product)
//! - **`store`** - shipped adapters: in-memory and JSON-file
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Records, identifiers, and the capped history structure
//! - [`error`] - Error types for the crate
//! - [`ledger`] - The synchronization core, [`TransactionLedger`]
//! - [`port`] - Trait definitions for external collaborators
//! - [`store`] - Record Store adapters
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bondfi_ledger::domain::{OwnerId, TradeKind};
//! use bondfi_ledger::ledger::TransactionLedger;
//! use bondfi_ledger::port::{Notifier, TracingNotifier};
//! use bondfi_ledger::store::MemoryRecordStore;
//! use rust_decimal_macros::dec;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryRecordStore::new());
//! let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
//! let ledger = TransactionLedger::new(store, notifier);
//!
//! ledger.load(Some(OwnerId::new("user-1"))).await?;
//! ledger
//!     .record_trade(TradeKind::Buy, dec!(500), dec!(500), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod port;
pub mod store;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use ledger::TransactionLedger;
