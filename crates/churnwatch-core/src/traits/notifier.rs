use crate::models::Notification;

/// Sink for user-visible feedback. Keeps the engine free of any
/// rendering-layer dependency.
pub trait INotifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
