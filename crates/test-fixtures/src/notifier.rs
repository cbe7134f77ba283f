use std::sync::Mutex;

use churnwatch_core::models::{Notification, NotificationLevel};
use churnwatch_core::traits::INotifier;

/// Keeps every notification for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().expect("notifier lock poisoned").clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications().into_iter().map(|n| n.message).collect()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.notifications()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().expect("notifier lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.seen.lock().expect("notifier lock poisoned").clear();
    }
}

impl INotifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
    }
}
