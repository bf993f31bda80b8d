//! Owner-scoped event fan-out shared by the store adapters.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::OwnerId;
use crate::port::{RecordEvent, RecordStream};

/// Fan-out of change events to per-owner subscribers.
///
/// Senders whose stream has been dropped are pruned on the next emit, so
/// releasing a subscription is just dropping the [`RecordStream`].
#[derive(Debug, Default)]
pub(crate) struct EventHub {
    subscribers: Mutex<HashMap<OwnerId, Vec<mpsc::UnboundedSender<RecordEvent>>>>,
}

impl EventHub {
    pub(crate) fn subscribe(&self, owner: &OwnerId) -> RecordStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .entry(owner.clone())
            .or_default()
            .push(tx);
        RecordStream::new(rx)
    }

    pub(crate) fn emit(&self, owner: &OwnerId, event: RecordEvent) {
        let mut subscribers = self.subscribers.lock();
        if let Some(senders) = subscribers.get_mut(owner) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            if senders.is_empty() {
                subscribers.remove(owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;

    #[tokio::test]
    async fn events_reach_only_the_matching_owner() {
        let hub = EventHub::default();
        let mut u1 = hub.subscribe(&OwnerId::new("u1"));
        let mut u2 = hub.subscribe(&OwnerId::new("u2"));

        hub.emit(
            &OwnerId::new("u1"),
            RecordEvent::Removed(RecordId::new("r1")),
        );

        assert_eq!(
            u1.recv().await,
            Some(RecordEvent::Removed(RecordId::new("r1")))
        );
        // u2 saw nothing; its channel is still open and empty.
        drop(hub);
        assert_eq!(u2.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_streams_are_pruned() {
        let hub = EventHub::default();
        let stream = hub.subscribe(&OwnerId::new("u1"));
        drop(stream);

        hub.emit(
            &OwnerId::new("u1"),
            RecordEvent::Removed(RecordId::new("r1")),
        );
        assert!(hub.subscribers.lock().is_empty());
    }
}
