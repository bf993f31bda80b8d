//! JSON-file Record Store.
//!
//! The crate's analogue of the original product's browser local-storage
//! backend: one JSON document holding every owner's records, rewritten
//! atomically on each mutation. Realtime events are fanned out to
//! in-process subscribers the same way the memory store does it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use super::hub::EventHub;
use crate::domain::{NewTrade, OwnerId, RecordId, TransactionRecord};
use crate::error::StoreError;
use crate::port::{RecordEvent, RecordStore, RecordStream};

type Tables = HashMap<OwnerId, Vec<TransactionRecord>>;

/// File-backed store for a single-process demo.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    tables: RwLock<Tables>,
    hub: EventHub,
}

impl JsonFileRecordStore {
    /// Open a store at `path`, loading existing records if the file is
    /// present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(err) => return Err(StoreError::Io(err)),
        };
        debug!(path = %path.display(), "opened json record store");
        Ok(Self {
            path,
            tables: RwLock::new(tables),
            hub: EventHub::default(),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize the tables and replace the backing file atomically
    /// (write to a sibling temp file, then rename over).
    fn persist(&self, tables: &Tables) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(tables)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn fetch_recent(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let tables = self.tables.read();
        let mut rows: Vec<_> = tables.get(owner).cloned().unwrap_or_default();
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
        {
            let mut tables = self.tables.write();
            tables
                .entry(trade.owner_id.clone())
                .or_default()
                .push(record.clone());
            self.persist(&tables)?;
        }
        self.hub
            .emit(&trade.owner_id, RecordEvent::Created(record.clone()));
        Ok(record)
    }

    async fn delete_all(&self, owner: &OwnerId) -> Result<u64, StoreError> {
        let removed = {
            let mut tables = self.tables.write();
            let removed = tables.remove(owner).unwrap_or_default();
            self.persist(&tables)?;
            removed
        };
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
