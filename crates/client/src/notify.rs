//! Toast notification plumbing.
//!
//! The cart manager depends on an injected [`Notifier`] rather than a UI
//! hook, so its contract - exactly one toast per mutating operation, success
//! or failure - stays testable without a UI tree.

use std::sync::Mutex;

use mercato_core::{Notification, NotificationId};

/// Sink for transient user-facing notifications.
pub trait Notifier: Send + Sync {
    /// Publish a notification. Implementations must not deduplicate.
    fn notify(&self, notification: Notification);
}

/// Append-only collection of active toasts with individual dismissal.
///
/// The default [`Notifier`] implementation: UIs subscribe by draining or
/// snapshotting `active()`; auto-dismissal is the renderer's job, driven by
/// each notification's `dismiss_after`.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    active: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    /// Create an empty notification center.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the currently active notifications, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        self.active
            .lock()
            .map(|active| active.clone())
            .unwrap_or_default()
    }

    /// Dismiss a single notification by ID. Unknown IDs are ignored.
    pub fn dismiss(&self, id: &NotificationId) {
        if let Ok(mut active) = self.active.lock() {
            active.retain(|notification| notification.id != *id);
        }
    }

    /// Dismiss everything.
    pub fn dismiss_all(&self) {
        if let Ok(mut active) = self.active.lock() {
            active.clear();
        }
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        tracing::debug!(
            severity = ?notification.severity,
            message = %notification.message,
            "toast"
        );
        if let Ok(mut active) = self.active.lock() {
            active.push(notification);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_append_in_order() {
        let center = NotificationCenter::new();
        center.notify(Notification::success("first"));
        center.notify(Notification::error("second"));

        let active = center.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active.first().unwrap().message, "first");
        assert_eq!(active.get(1).unwrap().message, "second");
    }

    #[test]
    fn test_identical_messages_are_not_deduplicated() {
        let center = NotificationCenter::new();
        center.notify(Notification::success("added to cart"));
        center.notify(Notification::success("added to cart"));
        assert_eq!(center.active().len(), 2);
    }

    #[test]
    fn test_dismiss_removes_only_target() {
        let center = NotificationCenter::new();
        center.notify(Notification::success("keep"));
        center.notify(Notification::success("drop"));

        let target = center.active().get(1).unwrap().id.clone();
        center.dismiss(&target);

        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().unwrap().message, "keep");
    }

    #[test]
    fn test_dismiss_all() {
        let center = NotificationCenter::new();
        center.notify(Notification::info("a"));
        center.notify(Notification::info("b"));
        center.dismiss_all();
        assert!(center.active().is_empty());
    }
}
