//! Notice-capturing notifier.

use parking_lot::Mutex;

use crate::port::{Notice, NoticeLevel, Notifier};

/// Captures every notice for later assertion.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    /// All notices, in emission order.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Error-level notices only.
    pub fn errors(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .cloned()
            .collect()
    }

    /// Info-level notices only.
    pub fn infos(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.level == NoticeLevel::Info)
            .cloned()
            .collect()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
