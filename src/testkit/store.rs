//! Failure-injecting store wrapper.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{NewTrade, OwnerId, TransactionRecord};
use crate::error::StoreError;
use crate::port::{RecordStore, RecordStream};

/// Wraps a store and fails the next call of a chosen operation with a
/// [`StoreError`], then passes through again.
pub struct FlakyStore<S> {
    inner: Arc<S>,
    fail_fetch: AtomicBool,
    fail_insert: AtomicBool,
    fail_delete: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            fail_fetch: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
        }
    }

    pub fn fail_next_fetch(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_insert(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_subscribe(&self) {
        self.fail_subscribe.store(true, Ordering::SeqCst);
    }

    fn trip(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.swap(false, Ordering::SeqCst) {
            Err(StoreError::Network("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: RecordStore + 'static> RecordStore for FlakyStore<S> {
    async fn fetch_recent(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        Self::trip(&self.fail_fetch)?;
        self.inner.fetch_recent(owner, limit).await
    }

    async fn insert(&self, trade: NewTrade) -> Result<TransactionRecord, StoreError> {
        Self::trip(&self.fail_insert)?;
        self.inner.insert(trade).await
    }

    async fn delete_all(&self, owner: &OwnerId) -> Result<u64, StoreError> {
        Self::trip(&self.fail_delete)?;
        self.inner.delete_all(owner).await
    }

    async fn subscribe(&self, owner: &OwnerId) -> Result<RecordStream, StoreError> {
        Self::trip(&self.fail_subscribe)?;
        self.inner.subscribe(owner).await
    }
}
