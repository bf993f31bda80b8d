//! Ports to external collaborators.

pub mod notifier;
pub mod store;

pub use notifier::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use store::{RecordEvent, RecordStore, RecordStream};
