//! Builders for trade records with explicit ids and timestamps.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{OwnerId, RecordId, TradeKind, TransactionRecord};

fn record(
    id: &str,
    owner: &str,
    kind: TradeKind,
    amount: Decimal,
    unix_secs: i64,
) -> TransactionRecord {
    TransactionRecord {
        id: RecordId::new(id),
        owner_id: OwnerId::new(owner),
        kind,
        fiat_amount: amount,
        token_amount: amount,
        external_ref: match kind {
            TradeKind::YieldClaim => None,
            _ => Some(format!("0x{:064x}", unix_secs)),
        },
        created_at: Utc.timestamp_opt(unix_secs, 0).unwrap(),
    }
}

/// A buy record at the 1:1 peg.
pub fn buy(id: &str, owner: &str, amount: Decimal, unix_secs: i64) -> TransactionRecord {
    record(id, owner, TradeKind::Buy, amount, unix_secs)
}

/// A sell record at the 1:1 peg.
pub fn sell(id: &str, owner: &str, amount: Decimal, unix_secs: i64) -> TransactionRecord {
    record(id, owner, TradeKind::Sell, amount, unix_secs)
}

/// A yield-claim record; carries no settlement reference.
pub fn yield_claim(id: &str, owner: &str, amount: Decimal, unix_secs: i64) -> TransactionRecord {
    record(id, owner, TradeKind::YieldClaim, amount, unix_secs)
}
