//! Toast-style notifications raised by mutations
//!
//! Mutations report their outcome through a [`Notifier`] instead of printing,
//! so the dashboard decides where and when notifications are shown.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::{error, info};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Collects notifications until the presentation layer drains them
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: Mutex<Vec<Notification>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: NotificationLevel, message: &str) {
        let notification = Notification {
            level,
            message: message.to_string(),
            created_at: Utc::now(),
        };
        // A poisoned queue only loses toasts.
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(notification);
        }
    }

    /// Take every pending notification, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastQueue {
    fn success(&self, message: &str) {
        info!(toast = message, "Success notification");
        self.push(NotificationLevel::Success, message);
    }

    fn error(&self, message: &str) {
        error!(toast = message, "Error notification");
        self.push(NotificationLevel::Error, message);
    }
}
