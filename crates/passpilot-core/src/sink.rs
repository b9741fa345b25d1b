//! Notification sinks

use passpilot_api::Notification;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives expiring-soon notifications (a toast surface, a log, a channel)
pub trait NotificationSink: Send + Sync {
    fn emit(&self, notification: &Notification);
}

/// Forwards notifications into an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn emit(&self, notification: &Notification) {
        if self.tx.send(notification.clone()).is_err() {
            debug!(pass_id = %notification.pass_id, "Notification receiver closed, dropping");
        }
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    recorded: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Remove and return everything emitted so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, notification: &Notification) {
        self.lock().push(notification.clone());
    }
}
