//! Store-agnostic domain types.

mod history;
mod ids;
mod record;

pub use history::{TradeHistory, HISTORY_CAP};
pub use ids::{OwnerId, RecordId};
pub use record::{simulated_settlement_ref, NewTrade, TradeKind, TransactionRecord};
