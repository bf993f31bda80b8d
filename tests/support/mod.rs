//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use bondfi_ledger::domain::{NewTrade, OwnerId, TransactionRecord};
use bondfi_ledger::error::StoreError;
use bondfi_ledger::port::{RecordStore, RecordStream};
use bondfi_ledger::store::MemoryRecordStore;

/// Store wrapper for forcing interleavings.
///
/// `fetch_recent` takes its snapshot immediately but does not return it
/// until [`GatedStore::release`] is called, so a load can be held in
/// flight while something else happens. Subscriptions pass through
/// freely unless armed with [`GatedStore::hold_subscribes`].
pub struct GatedStore {
    inner: Arc<MemoryRecordStore>,
    fetch_gate: Semaphore,
    subscribe_gate: Semaphore,
    holding_subscribes: AtomicBool,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryRecordStore>) -> Self {
        Self {
            inner,
            fetch_gate: Semaphore::new(0),
            subscribe_gate: Semaphore::new(0),
            holding_subscribes: AtomicBool::new(false),
        }
    }

    /// Let one pending (or future) fetch return its snapshot.
    pub fn release(&self) {
        self.fetch_gate.add_permits(1);
    }

    /// Park subscriptions issued from now on.
    pub fn hold_subscribes(&self) {
        self.holding_subscribes.store(true, Ordering::SeqCst);
    }

    /// Stop parking new subscriptions. Already-parked ones stay parked
    /// until [`GatedStore::release_subscribe`].
    pub fn pass_subscribes(&self) {
        self.holding_subscribes.store(false, Ordering::SeqCst);
    }

    /// Let one parked subscription proceed.
    pub fn release_subscribe(&self) {
        self.subscribe_gate.add_permits(1);
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn fetch_recent(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        // Snapshot first, then park: the caller sees the store as it was
        // when the fetch was issued, not when it was released.
        let snapshot = self.inner.fetch_recent(owner, limit).await?;
        self.fetch_gate
            .acquire()
            .await
            .expect("fetch gate semaphore closed")
            .forget();
        Ok(snapshot)
    }

    async fn insert(&self, trade: NewTrade) -> Result<TransactionRecord, StoreError> {
        self.inner.insert(trade).await
    }

    async fn delete_all(&self, owner: &OwnerId) -> Result<u64, StoreError> {
        self.inner.delete_all(owner).await
    }

    async fn subscribe(&self, owner: &OwnerId) -> Result<RecordStream, StoreError> {
        if self.holding_subscribes.load(Ordering::SeqCst) {
            self.subscribe_gate
                .acquire()
                .await
                .expect("subscribe gate semaphore closed")
                .forget();
        }
        self.inner.subscribe(owner).await
    }
}
