//! Notifier port for user-visible notifications.
//!
//! Ledger failures are never silent and never retried internally; they are
//! surfaced through this trait for the presentation layer to render
//! (toasts, in the original product).

use tracing::{error, info};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub detail: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            detail: detail.into(),
        }
    }
}

/// Trait for notification handlers.
///
/// Notifications are fire-and-forget. Implementations must be thread-safe
/// (`Send + Sync`) and should return quickly; slow sinks should hand off
/// to an async task.
pub trait Notifier: Send + Sync {
    /// Handle a notice.
    fn notify(&self, notice: Notice);
}

/// Default sink that writes notices to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(title = %notice.title, detail = %notice.detail, "notice"),
            NoticeLevel::Error => error!(title = %notice.title, detail = %notice.detail, "notice"),
        }
    }
}
