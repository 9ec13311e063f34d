//! Notification port — user-facing, fire-and-forget messages.

use serde::{Deserialize, Serialize};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Parse a configured level, falling back to [`NotificationLevel::Info`].
    #[must_use]
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("success") => Self::Success,
            Some("warning" | "warn") => Self::Warning,
            Some("error") => Self::Error,
            _ => Self::Info,
        }
    }
}

/// Optional presentation hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub title: Option<String>,
}

/// Delivers a notification. Must not block or fail.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, level: NotificationLevel, options: NotificationOptions);
}

impl<T: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<T> {
    fn notify(&self, message: &str, level: NotificationLevel, options: NotificationOptions) {
        (**self).notify(message, level, options);
    }
}
