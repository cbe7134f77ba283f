//! Built-in [`INotifier`] implementations.

use tokio::sync::mpsc;

use churnwatch_core::models::{Notification, NotificationLevel};
use churnwatch_core::traits::INotifier;

/// Writes notifications to the tracing log. Used by the headless monitor.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl INotifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => tracing::info!("churnwatch: {}", notification.message),
            NotificationLevel::Warning => tracing::warn!("churnwatch: {}", notification.message),
            NotificationLevel::Error => tracing::error!("churnwatch: {}", notification.message),
        }
    }
}

/// Forwards notifications to a channel, for a rendering layer that drains
/// them on its own schedule.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl INotifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("churnwatch: notification receiver gone, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_notifier_forwards_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(Notification::info("one"));
        notifier.notify(Notification::error("two"));

        assert_eq!(rx.try_recv().unwrap().message, "one");
        let second = rx.try_recv().unwrap();
        assert_eq!(second.level, NotificationLevel::Error);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_notifier_survives_dropped_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify(Notification::warning("nobody listening"));
    }
}
