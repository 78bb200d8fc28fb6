//! User-visible notifications
//!
//! Fire-and-forget: a notifier never fails its caller.

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Routes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success | NotificationKind::Info => info!("[{:?}] {}", kind, message),
            NotificationKind::Warning => warn!("{}", message),
            NotificationKind::Error => error!("{}", message),
        }
    }
}

/// Keeps every notification for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(NotificationKind, String)> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<(NotificationKind, String)> {
        self.sent().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((kind, message.to_string()));
    }
}
