//! Notification sinks for upload outcomes.
//!
//! The orchestrator only needs "show a success / error / info message". The
//! presentation layer decides what that means; the implementations here
//! cover logging, forwarding to a UI task, and recording for tests.

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
}

/// A notification as seen by a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notification {
    Success(String),
    Error(String),
    Info(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Success(m) | Notification::Error(m) | Notification::Info(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error(_))
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notification = "success", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::warn!(notification = "error", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(notification = "info", "{}", message);
    }
}

/// Forwards notifications to a receiver, typically a UI task.
///
/// Sending never blocks. Once the receiver is dropped, notifications are
/// discarded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}

impl Notifier for ChannelNotifier {
    fn success(&self, message: &str) {
        self.send(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.send(Notification::Error(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.send(Notification::Info(message.to_string()));
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, notification: Notification) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(notification);
    }

    /// Snapshot of everything recorded so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(Notification::is_error)
            .map(|n| n.message().to_string())
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Success(m) => Some(m),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Notification::Error(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(Notification::Info(message.to_string()));
    }
}
