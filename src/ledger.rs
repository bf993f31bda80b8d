//! Transaction ledger synchronization core.
//!
//! [`TransactionLedger`] owns the in-memory, capped, newest-first history
//! of one owner's trades and keeps it consistent with the Record Store:
//! a bulk fetch on load, plus a realtime change stream whose events are
//! merged by record id. Aggregates (total invested, net token balance)
//! derive from the cached window only.
//!
//! Interleaving is the hazard, not parallelism: a fetch can resolve after
//! the stream has already delivered newer events, and the owner can change
//! while either is in flight. Both are handled the same way: state carries
//! an epoch that is bumped on every owner change, and any result resolving
//! under a stale epoch is discarded instead of applied.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::{
    NewTrade, OwnerId, RecordId, TradeHistory, TradeKind, TransactionRecord, HISTORY_CAP,
};
use crate::error::{LedgerError, StoreError};
use crate::port::{Notice, Notifier, RecordEvent, RecordStore};

/// Bound on every store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

struct LedgerState {
    owner: Option<OwnerId>,
    /// Bumped on every owner change; stale async results check it on
    /// resolution and are discarded on mismatch.
    epoch: u64,
    history: TradeHistory,
    /// Ids delivered by the current epoch's stream. The fetch snapshot
    /// predates these, so reconciliation must not drop them.
    stream_applied: HashSet<RecordId>,
    loading: bool,
}

/// Per-owner trade history, synchronized with a [`RecordStore`].
pub struct TransactionLedger<S> {
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
    state: Arc<RwLock<LedgerState>>,
    timeout: Duration,
    /// Handle of the subscription pump task, tagged with the epoch it
    /// serves so a slower, older `load` cannot displace a newer pump.
    pump: Mutex<Option<(u64, JoinHandle<()>)>>,
}

impl<S: RecordStore + 'static> TransactionLedger<S> {
    /// Create a ledger with no owner and the default store timeout.
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_timeout(store, notifier, DEFAULT_STORE_TIMEOUT)
    }

    /// Create a ledger with an explicit store timeout.
    pub fn with_timeout(store: Arc<S>, notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            state: Arc::new(RwLock::new(LedgerState {
                owner: None,
                epoch: 0,
                history: TradeHistory::new(),
                stream_applied: HashSet::new(),
                loading: false,
            })),
            timeout,
            pump: Mutex::new(None),
        }
    }

    /// Switch the owner context and synchronize with the store.
    ///
    /// With no owner the collection is cleared and the subscription torn
    /// down. With an owner, the subscription is (re)established before the
    /// bulk fetch so no event can fall between snapshot and stream, then
    /// up to [`HISTORY_CAP`] newest records are fetched and reconciled
    /// by id: local records the store no longer has are dropped, unless
    /// the live stream delivered them after the snapshot was taken.
    /// A fetch that resolves after the owner changed again is discarded.
    /// Fetch failure keeps whatever was already held and surfaces an
    /// error notice.
    pub async fn load(&self, owner: Option<OwnerId>) -> Result<(), LedgerError> {
        self.stop_pump();

        let (epoch, owner) = {
            let mut state = self.state.write();
            state.epoch += 1;
            state.stream_applied.clear();
            if state.owner != owner {
                // Never merge collections across owners.
                state.history.clear();
            }
            state.owner = owner.clone();
            match owner {
                None => {
                    state.loading = false;
                    return Ok(());
                }
                Some(owner) => {
                    state.loading = true;
                    (state.epoch, owner)
                }
            }
        };

        let stream = match self.bounded(self.store.subscribe(&owner)).await {
            Ok(stream) => stream,
            Err(err) => {
                self.finish_loading(epoch);
                self.notifier.notify(Notice::error(
                    "Error loading transactions",
                    err.to_string(),
                ));
                return Err(err.into());
            }
        };
        self.start_pump(stream, epoch);

        match self.bounded(self.store.fetch_recent(&owner, HISTORY_CAP)).await {
            Ok(records) => {
                let mut state = self.state.write();
                if state.epoch != epoch {
                    debug!(%owner, "discarding stale fetch result");
                    return Ok(());
                }
                let LedgerState {
                    history,
                    stream_applied,
                    ..
                } = &mut *state;
                history.reconcile_fetched(records, stream_applied);
                state.loading = false;
                Ok(())
            }
            Err(err) => {
                self.finish_loading(epoch);
                self.notifier.notify(Notice::error(
                    "Error loading transactions",
                    err.to_string(),
                ));
                Err(err.into())
            }
        }
    }

    /// Submit a trade for durable insertion and return the
    /// store-confirmed record.
    ///
    /// There is no optimistic local insert: the confirmed record reaches
    /// the collection through the realtime stream. Sell amounts are
    /// validated against the current net token balance here, as the
    /// single source of truth for that precondition.
    pub async fn record_trade(
        &self,
        kind: TradeKind,
        fiat_amount: Decimal,
        token_amount: Decimal,
        external_ref: Option<String>,
    ) -> Result<TransactionRecord, LedgerError> {
        let owner = match self.state.read().owner.clone() {
            Some(owner) => owner,
            None => {
                self.notifier.notify(Notice::error(
                    "Authentication required",
                    "Please sign in to make transactions",
                ));
                return Err(LedgerError::AuthRequired);
            }
        };

        if fiat_amount <= Decimal::ZERO {
            let err = LedgerError::InvalidAmount {
                reason: format!("amount must be positive, got {fiat_amount}"),
            };
            self.notifier
                .notify(Notice::error("Invalid amount", err.to_string()));
            return Err(err);
        }
        if kind == TradeKind::Sell {
            let held = self.state.read().history.net_token_balance();
            if token_amount > held {
                let err = LedgerError::InsufficientHoldings {
                    requested: token_amount,
                    held,
                };
                self.notifier
                    .notify(Notice::error("Transaction failed", err.to_string()));
                return Err(err);
            }
        }

        let trade = NewTrade {
            owner_id: owner,
            kind,
            fiat_amount,
            token_amount,
            external_ref,
        };
        match self.bounded(self.store.insert(trade)).await {
            Ok(record) => {
                trace!(id = %record.id, ?kind, "trade confirmed by store");
                Ok(record)
            }
            Err(err) => {
                self.notifier
                    .notify(Notice::error("Transaction failed", err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Delete all of the owner's records from the store, then empty the
    /// local collection. On store failure the collection is left intact.
    pub async fn clear_history(&self) -> Result<u64, LedgerError> {
        let owner = match self.state.read().owner.clone() {
            Some(owner) => owner,
            None => {
                self.notifier.notify(Notice::error(
                    "Authentication required",
                    "Please sign in to make transactions",
                ));
                return Err(LedgerError::AuthRequired);
            }
        };

        match self.bounded(self.store.delete_all(&owner)).await {
            Ok(deleted) => {
                self.state.write().history.clear();
                self.notifier.notify(Notice::info(
                    "History cleared",
                    "All transactions have been removed",
                ));
                Ok(deleted)
            }
            Err(err) => {
                self.notifier
                    .notify(Notice::error("Error clearing history", err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Snapshot of the records, newest first, at most [`HISTORY_CAP`].
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.state.read().history.snapshot()
    }

    /// Whether the initial fetch for the current owner is still in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// The owner whose records are in scope, if any.
    pub fn owner(&self) -> Option<OwnerId> {
        self.state.read().owner.clone()
    }

    /// Sum of fiat spent on buys, over the cached window.
    pub fn total_invested(&self) -> Decimal {
        self.state.read().history.total_invested()
    }

    /// Tokens bought minus tokens sold; yield claims do not count.
    pub fn net_token_balance(&self) -> Decimal {
        self.state.read().history.net_token_balance()
    }

    /// Tear down the subscription pump. Also runs on drop.
    pub fn shutdown(&self) {
        self.stop_pump();
    }

    fn start_pump(&self, mut stream: crate::port::RecordStream, epoch: u64) {
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                let mut state = state.write();
                if state.epoch != epoch {
                    // Owner changed under us; the replacement pump owns
                    // the new subscription.
                    break;
                }
                match event {
                    RecordEvent::Created(record) => {
                        // Remember the id even on duplicate delivery: any
                        // id the stream carried this epoch must survive a
                        // reconcile against an older fetch snapshot.
                        state.stream_applied.insert(record.id.clone());
                        if !state.history.apply_created(record) {
                            debug!("duplicate Created delivery ignored");
                        }
                    }
                    RecordEvent::Removed(id) => {
                        // Unknown ids are benign: the record may have been
                        // evicted or never fetched.
                        state.history.apply_removed(&id);
                    }
                }
            }
        });

        let mut pump = self.pump.lock();
        match pump.as_ref() {
            // A newer load already installed its pump; this one is stale
            // and must not displace it.
            Some((held, _)) if *held > epoch => handle.abort(),
            _ => {
                if let Some((_, old)) = pump.replace((epoch, handle)) {
                    old.abort();
                }
            }
        }
    }

    fn stop_pump(&self) {
        if let Some((_, handle)) = self.pump.lock().take() {
            handle.abort();
        }
    }

    fn finish_loading(&self, epoch: u64) {
        let mut state = self.state.write();
        if state.epoch == epoch {
            state.loading = false;
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "store round trip timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

impl<S> Drop for TransactionLedger<S> {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.pump.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use crate::testkit::{CollectingNotifier, FlakyStore};
    use rust_decimal_macros::dec;

    fn owner() -> OwnerId {
        OwnerId::new("u1")
    }

    fn ledger_with(
        store: Arc<MemoryRecordStore>,
    ) -> (TransactionLedger<MemoryRecordStore>, Arc<CollectingNotifier>) {
        let notifier = Arc::new(CollectingNotifier::default());
        let ledger = TransactionLedger::new(store, notifier.clone() as Arc<dyn Notifier>);
        (ledger, notifier)
    }

    #[tokio::test]
    async fn record_trade_without_owner_never_contacts_store() {
        let store = Arc::new(MemoryRecordStore::new());
        let (ledger, notifier) = ledger_with(store.clone());

        let result = ledger
            .record_trade(TradeKind::Buy, dec!(100), dec!(100), None)
            .await;

        assert!(matches!(result, Err(LedgerError::AuthRequired)));
        assert_eq!(store.insert_count(), 0);
        assert_eq!(notifier.errors().len(), 1);
        assert_eq!(notifier.errors()[0].title, "Authentication required");
    }

    #[tokio::test]
    async fn record_trade_rejects_non_positive_amounts() {
        let store = Arc::new(MemoryRecordStore::new());
        let (ledger, _notifier) = ledger_with(store.clone());
        ledger.load(Some(owner())).await.unwrap();

        let result = ledger
            .record_trade(TradeKind::Buy, dec!(0), dec!(0), None)
            .await;

        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
        assert_eq!(store.insert_count(), 0);
    }

    #[tokio::test]
    async fn sell_exceeding_holdings_is_rejected_before_the_store() {
        let store = Arc::new(MemoryRecordStore::new());
        let (ledger, _notifier) = ledger_with(store.clone());
        ledger.load(Some(owner())).await.unwrap();

        ledger
            .record_trade(TradeKind::Buy, dec!(100), dec!(100), None)
            .await
            .unwrap();
        store.flush().await;

        let result = ledger
            .record_trade(TradeKind::Sell, dec!(150), dec!(150), None)
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientHoldings { .. })
        ));
        assert_eq!(store.insert_count(), 1);
    }

    #[tokio::test]
    async fn confirmed_trade_arrives_through_the_stream_not_optimistically() {
        let store = Arc::new(MemoryRecordStore::new());
        let (ledger, _notifier) = ledger_with(store.clone());
        ledger.load(Some(owner())).await.unwrap();

        let record = ledger
            .record_trade(TradeKind::Buy, dec!(500), dec!(500), None)
            .await
            .unwrap();
        assert_eq!(record.fiat_amount, dec!(500));

        store.flush().await;
        let records = ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, record.id);
        assert_eq!(ledger.total_invested(), dec!(500));
    }

    #[tokio::test]
    async fn load_failure_keeps_prior_records_and_surfaces_notice() {
        let inner = Arc::new(MemoryRecordStore::new());
        let store = Arc::new(FlakyStore::new(inner.clone()));
        let notifier = Arc::new(CollectingNotifier::default());
        let ledger =
            TransactionLedger::new(store.clone(), notifier.clone() as Arc<dyn Notifier>);

        ledger.load(Some(owner())).await.unwrap();
        ledger
            .record_trade(TradeKind::Buy, dec!(100), dec!(100), None)
            .await
            .unwrap();
        inner.flush().await;
        assert_eq!(ledger.records().len(), 1);

        store.fail_next_fetch();
        let result = ledger.load(Some(owner())).await;
        assert!(result.is_err());
        assert!(!ledger.is_loading());
        assert_eq!(ledger.records().len(), 1);
        assert!(notifier
            .errors()
            .iter()
            .any(|n| n.title == "Error loading transactions"));
    }

    #[tokio::test]
    async fn owner_switch_discards_previous_collection() {
        let store = Arc::new(MemoryRecordStore::new());
        let (ledger, _notifier) = ledger_with(store.clone());

        ledger.load(Some(owner())).await.unwrap();
        ledger
            .record_trade(TradeKind::Buy, dec!(100), dec!(100), None)
            .await
            .unwrap();
        store.flush().await;
        assert_eq!(ledger.records().len(), 1);

        ledger.load(Some(OwnerId::new("u2"))).await.unwrap();
        assert!(ledger.records().is_empty());
        assert_eq!(ledger.owner(), Some(OwnerId::new("u2")));

        ledger.load(None).await.unwrap();
        assert!(ledger.records().is_empty());
        assert!(!ledger.is_loading());
        assert_eq!(ledger.owner(), None);
    }
}
