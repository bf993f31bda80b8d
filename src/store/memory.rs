//! In-memory Record Store with realtime fan-out.
//!
//! The default backend for demos and tests. Behaves like the hosted
//! store: assigns ids and timestamps on insert, replicates row-level
//! changes to owner-scoped subscribers, and deletes emit one `Removed`
//! event per row.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::hub::EventHub;
use crate::domain::{NewTrade, OwnerId, RecordId, TransactionRecord};
use crate::error::StoreError;
use crate::port::{RecordEvent, RecordStore, RecordStream};

/// In-memory store keyed by owner.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<OwnerId, Vec<TransactionRecord>>>,
    hub: EventHub,
    inserts: AtomicU64,
}

impl MemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts, for asserting a call never reached
    /// the store.
    pub fn insert_count(&self) -> u64 {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Yield to the scheduler until in-flight event deliveries have been
    /// drained by subscriber tasks. Test convenience.
    pub async fn flush(&self) {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_recent(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let records = self.records.read();
        let mut rows: Vec<_> = records.get(owner).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert(&self, trade: NewTrade) -> Result<TransactionRecord, StoreError> {
        let record = TransactionRecord {
            id: RecordId::generate(),
            owner_id: trade.owner_id.clone(),
            kind: trade.kind,
            fiat_amount: trade.fiat_amount,
            token_amount: trade.token_amount,
            external_ref: trade.external_ref,
            created_at: Utc::now(),
        };
        self.records
            .write()
            .entry(trade.owner_id.clone())
            .or_default()
            .push(record.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.hub
            .emit(&trade.owner_id, RecordEvent::Created(record.clone()));
        Ok(record)
    }

    async fn delete_all(&self, owner: &OwnerId) -> Result<u64, StoreError> {
        let removed = self.records.write().remove(owner).unwrap_or_default();
        for record in &removed {
            self.hub
                .emit(owner, RecordEvent::Removed(record.id.clone()));
        }
        Ok(removed.len() as u64)
    }

    async fn subscribe(&self, owner: &OwnerId) -> Result<RecordStream, StoreError> {
        Ok(self.hub.subscribe(owner))
    }
}
