//! Notification sinks.

use std::sync::Mutex;

use bizhub_app::ports::{NotificationLevel, NotificationOptions, NotificationSink};

/// Emits each notification as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, message: &str, level: NotificationLevel, options: NotificationOptions) {
        let title = options.title.as_deref().unwrap_or("");
        match level {
            NotificationLevel::Error => tracing::error!(title, "{message}"),
            NotificationLevel::Warning => tracing::warn!(title, "{message}"),
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(title, level = ?level, "{message}");
            }
        }
    }
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub message: String,
    pub level: NotificationLevel,
    pub title: Option<String>,
}

/// Keeps every notification so it can be listed later.
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotificationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentNotification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, message: &str, level: NotificationLevel, options: NotificationOptions) {
        let notification = SentNotification {
            message: message.to_string(),
            level,
            title: options.title,
        };
        match self.sent.lock() {
            Ok(mut sent) => sent.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
