//! User-facing Notices
//!
//! Transient notifications raised by form validation and write actions.
//! A failed backend call surfaces here with its raw error message; there
//! is no classification beyond "operation failed".

use serde::Serialize;
use std::sync::Mutex;

/// Visual weight of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notice {
    /// Informational notice
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    /// Error notice
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == Variant::Destructive
    }
}

/// Sink for notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.variant {
            Variant::Default => {
                tracing::info!(title = %notice.title, "{}", notice.description)
            }
            Variant::Destructive => {
                tracing::warn!(title = %notice.title, "{}", notice.description)
            }
        }
    }
}

/// Keeps notices in memory until taken
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all collected notices
    pub fn take(&self) -> Vec<Notice> {
        let mut notices = self
            .notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut *notices)
    }

    /// Most recent notice, if any
    pub fn last(&self) -> Option<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_notifier() {
        let notifier = CollectingNotifier::new();
        notifier.notify(Notice::info("Account Added", "Cash added successfully"));
        notifier.notify(Notice::error("Error", "permission denied"));

        assert!(notifier.last().unwrap().is_destructive());

        let taken = notifier.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].title, "Account Added");
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn test_notice_serializes_variant() {
        let json = serde_json::to_string(&Notice::error("Error", "boom")).unwrap();
        assert!(json.contains("\"variant\":\"destructive\""));
    }
}
