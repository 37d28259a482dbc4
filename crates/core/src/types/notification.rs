//! Transient user-facing notifications ("toasts").
//!
//! Every mutating cart operation emits exactly one notification on success and
//! on failure. Notifications are append-only and independently dismissible;
//! they are never deduplicated.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::NotificationId;

/// Default auto-dismiss duration for toasts.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(3000);

/// Notification severity, mapped to toast styling by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// A transient, user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique ID, used for individual dismissal.
    pub id: NotificationId,
    /// Severity for styling.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// How long the toast stays visible before auto-dismissing.
    pub dismiss_after: Duration,
}

impl Notification {
    /// Create a notification with a fresh random ID.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>, dismiss_after: Duration) -> Self {
        Self {
            id: NotificationId::new(Uuid::new_v4().to_string()),
            severity,
            message: message.into(),
            dismiss_after,
        }
    }

    /// Success toast with the default dismiss duration.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message, DEFAULT_DISMISS_AFTER)
    }

    /// Error toast with the default dismiss duration.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message, DEFAULT_DISMISS_AFTER)
    }

    /// Info toast with the default dismiss duration.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message, DEFAULT_DISMISS_AFTER)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_severity() {
        assert_eq!(Notification::success("ok").severity, Severity::Success);
        assert_eq!(Notification::error("no").severity, Severity::Error);
        assert_eq!(Notification::info("hi").severity, Severity::Info);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Notification::success("same message");
        let b = Notification::success("same message");
        // Never deduplicated: identical messages still get distinct IDs
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_severity_serde_snake_case() {
        let json = serde_json::to_string(&Severity::Success).unwrap();
        assert_eq!(json, "\"success\"");
    }
}
