//! Trade record types.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{OwnerId, RecordId};

/// Kind of trade a record represents.
///
/// Serialized forms match the backing store's rows (`buy`, `sell`, `yield`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    /// Fiat in, bond tokens out.
    #[serde(rename = "buy")]
    Buy,
    /// Bond tokens redeemed for fiat.
    #[serde(rename = "sell")]
    Sell,
    /// Accrued yield claimed; does not move the token balance.
    #[serde(rename = "yield")]
    YieldClaim,
}

/// A single confirmed trade.
///
/// Records are immutable once created: the store assigns `id` and
/// `created_at`, and nothing downstream ever rewrites a field. The 1:1
/// peg means `token_amount == fiat_amount` at creation time, but the two
/// are stored independently and must never be recomputed from each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: RecordId,
    #[serde(rename = "user_id")]
    pub owner_id: OwnerId,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    #[serde(rename = "amount")]
    pub fiat_amount: Decimal,
    #[serde(rename = "tokens")]
    pub token_amount: Decimal,
    /// Simulated settlement reference; present only for buys and sells.
    #[serde(rename = "tx_hash")]
    pub external_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for a trade about to be submitted to the store.
///
/// The store assigns `id` and `created_at` on durable insertion.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub owner_id: OwnerId,
    pub kind: TradeKind,
    pub fiat_amount: Decimal,
    pub token_amount: Decimal,
    pub external_ref: Option<String>,
}

/// Generate a fake settlement reference for a demo trade.
///
/// The product has no on-chain integration; a "transaction hash" is a
/// random 32-byte hex string.
pub fn simulated_settlement_ref() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("0x{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(kind: TradeKind) -> TransactionRecord {
        TransactionRecord {
            id: RecordId::new("r1"),
            owner_id: OwnerId::new("u1"),
            kind,
            fiat_amount: dec!(500),
            token_amount: dec!(500),
            external_ref: Some("0xabc".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn kind_serializes_to_store_row_values() {
        assert_eq!(serde_json::to_string(&TradeKind::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&TradeKind::Sell).unwrap(), "\"sell\"");
        assert_eq!(
            serde_json::to_string(&TradeKind::YieldClaim).unwrap(),
            "\"yield\""
        );
    }

    #[test]
    fn record_uses_store_row_field_names() {
        let json = serde_json::to_value(record(TradeKind::Buy)).unwrap();
        assert!(json.get("user_id").is_some());
        assert!(json.get("type").is_some());
        assert!(json.get("amount").is_some());
        assert!(json.get("tokens").is_some());
        assert!(json.get("tx_hash").is_some());
        assert!(json.get("owner_id").is_none());
    }

    #[test]
    fn record_round_trips_through_json() {
        let original = record(TradeKind::Sell);
        let json = serde_json::to_string(&original).unwrap();
        let parsed: TransactionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn settlement_ref_is_prefixed_hex() {
        let r = simulated_settlement_ref();
        assert!(r.starts_with("0x"));
        assert_eq!(r.len(), 66);
        assert!(r[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn settlement_refs_are_random() {
        assert_ne!(simulated_settlement_ref(), simulated_settlement_ref());
    }
}
