//! Record Store port.
//!
//! The ledger treats persistence and change notification as a black box
//! behind this trait. A hosted realtime database, a local JSON file, and
//! the in-memory test double all satisfy the same narrow contract.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{NewTrade, OwnerId, RecordId, TransactionRecord};
use crate::error::StoreError;

/// A change pushed by the store for one owner's scope.
///
/// Records are immutable once created, so there is no `Updated` variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEvent {
    /// A record was durably inserted.
    Created(TransactionRecord),
    /// A record was deleted.
    Removed(RecordId),
}

/// Owned receiving end of an owner-scoped subscription.
///
/// Dropping the stream releases the subscription; the store must stop
/// delivering events to it. One stream belongs to exactly one subscriber,
/// so teardown is deterministic.
#[derive(Debug)]
pub struct RecordStream {
    rx: mpsc::UnboundedReceiver<RecordEvent>,
}

impl RecordStream {
    /// Wrap a channel receiver handed out by a store implementation.
    pub fn new(rx: mpsc::UnboundedReceiver<RecordEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next event, or `None` once the store closes the stream.
    pub async fn recv(&mut self) -> Option<RecordEvent> {
        self.rx.recv().await
    }
}

/// Persistence and change notification for trade records.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `insert` assigns the record's `id` and `created_at`
/// - `delete_all` emits one `Removed` event per deleted row to subscribers
/// - Event delivery order matches emission order per subscriber, but
///   callers must not assume ordering relative to an in-flight
///   `fetch_recent`
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch up to `limit` most-recent records for an owner, ordered by
    /// `created_at` descending.
    async fn fetch_recent(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Durably insert a trade, returning the store-confirmed record.
    async fn insert(&self, trade: NewTrade) -> Result<TransactionRecord, StoreError>;

    /// Delete all of an owner's records. Returns the number deleted.
    async fn delete_all(&self, owner: &OwnerId) -> Result<u64, StoreError>;

    /// Open an owner-scoped change stream.
    async fn subscribe(&self, owner: &OwnerId) -> Result<RecordStream, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;

    #[test]
    fn removed_events_compare_by_id() {
        let a = RecordEvent::Removed(RecordId::new("r1"));
        let b = RecordEvent::Removed(RecordId::new("r1"));
        let c = RecordEvent::Removed(RecordId::new("r2"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn stream_yields_none_when_sender_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut stream = RecordStream::new(rx);

        tx.send(RecordEvent::Removed(RecordId::new("r1"))).unwrap();
        drop(tx);

        assert!(stream.recv().await.is_some());
        assert!(stream.recv().await.is_none());
    }
}
