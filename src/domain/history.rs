//! Capped, newest-first trade history.
//!
//! [`TradeHistory`] is the in-memory collection the ledger keeps consistent
//! with the Record Store. It is ordered by `created_at` descending, capped
//! at [`HISTORY_CAP`] records, and indexed by record id so duplicate
//! `Created` deliveries and `Removed` lookups are O(1).

use std::collections::{HashSet, VecDeque};

use rust_decimal::Decimal;

use super::ids::RecordId;
use super::record::{TradeKind, TransactionRecord};

/// Maximum number of records held in memory per owner.
pub const HISTORY_CAP: usize = 50;

/// Size-bounded ordered collection of an owner's trade records.
#[derive(Debug, Clone)]
pub struct TradeHistory {
    /// Newest first.
    records: VecDeque<TransactionRecord>,
    known: HashSet<RecordId>,
    cap: usize,
}

impl Default for TradeHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeHistory {
    /// Create an empty history with the standard cap.
    pub fn new() -> Self {
        Self::with_cap(HISTORY_CAP)
    }

    /// Create an empty history with an explicit cap.
    pub fn with_cap(cap: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(cap),
            known: HashSet::new(),
            cap,
        }
    }

    /// Apply a `Created` event: id-deduplicated sorted insert plus tail
    /// eviction past the cap.
    ///
    /// Returns `false` on duplicate delivery (the record was already held).
    pub fn apply_created(&mut self, record: TransactionRecord) -> bool {
        if self.known.contains(&record.id) {
            return false;
        }
        // Realtime events are newest-by-construction, so this is almost
        // always position 0; the scan covers out-of-order delivery and
        // merges of a bulk fetch.
        let pos = self
            .records
            .iter()
            .position(|r| r.created_at <= record.created_at)
            .unwrap_or(self.records.len());
        self.known.insert(record.id.clone());
        self.records.insert(pos, record);

        while self.records.len() > self.cap {
            if let Some(evicted) = self.records.pop_back() {
                self.known.remove(&evicted.id);
            }
        }
        true
    }

    /// Apply a `Removed` event. Unknown ids are a benign no-op.
    pub fn apply_removed(&mut self, id: &RecordId) -> bool {
        if !self.known.remove(id) {
            return false;
        }
        if let Some(pos) = self.records.iter().position(|r| &r.id == id) {
            self.records.remove(pos);
        }
        true
    }

    /// Reconcile a bulk-fetch snapshot with the history.
    ///
    /// The snapshot is authoritative for the store's current set, except
    /// that the live stream may have delivered records after the snapshot
    /// was taken. Local records absent from the snapshot are dropped
    /// unless their id is in `keep` (the stream-applied set); the
    /// snapshot's rows are then unioned in by id.
    pub fn reconcile_fetched(
        &mut self,
        fetched: Vec<TransactionRecord>,
        keep: &HashSet<RecordId>,
    ) {
        let fetched_ids: HashSet<RecordId> = fetched.iter().map(|r| r.id.clone()).collect();
        self.records
            .retain(|r| fetched_ids.contains(&r.id) || keep.contains(&r.id));
        self.known
            .retain(|id| fetched_ids.contains(id) || keep.contains(id));
        for record in fetched {
            self.apply_created(record);
        }
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
        self.known.clear();
    }

    /// Iterate records newest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter()
    }

    /// Clone the records into a newest-first vector.
    pub fn snapshot(&self) -> Vec<TransactionRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.known.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of fiat spent on buys, over the cached window only.
    pub fn total_invested(&self) -> Decimal {
        self.records
            .iter()
            .filter(|r| r.kind == TradeKind::Buy)
            .map(|r| r.fiat_amount)
            .sum()
    }

    /// Tokens bought minus tokens sold. Yield claims do not move it.
    pub fn net_token_balance(&self) -> Decimal {
        self.records
            .iter()
            .map(|r| match r.kind {
                TradeKind::Buy => r.token_amount,
                TradeKind::Sell => -r.token_amount,
                TradeKind::YieldClaim => Decimal::ZERO,
            })
            .sum()
    }
}
