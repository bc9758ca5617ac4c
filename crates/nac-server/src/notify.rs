//! Change notifications for the portal UI
//!
//! Services publish fire-and-forget events after they change the directory;
//! any number of subscribers (typically UI refresh loops) receive them.

use tokio::sync::broadcast;
use tracing::trace;

/// Default number of events a lagging subscriber may fall behind by
pub const DEFAULT_CAPACITY: usize = 64;

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    DeviceDetailsChanged,
    NetworkUsageChanged,
    UserDetailsChanged,
}

/// Broadcast bus for [`Notification`]s.
///
/// Publishing never blocks and never fails, even with no subscribers.
/// Subscribers that fall more than the channel capacity behind miss the
/// oldest events.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            trace!(?notification, "No notification subscribers");
        }
    }

    pub fn device_details_changed(&self) {
        self.publish(Notification::DeviceDetailsChanged);
    }

    pub fn network_usage_changed(&self) {
        self.publish(Notification::NetworkUsageChanged);
    }

    pub fn user_details_changed(&self) {
        self.publish(Notification::UserDetailsChanged);
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = NotificationBus::default();
        bus.device_details_changed();
        bus.user_details_changed();
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = NotificationBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.device_details_changed();
        bus.network_usage_changed();

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap(), Notification::DeviceDetailsChanged);
            assert_eq!(rx.recv().await.unwrap(), Notification::NetworkUsageChanged);
        }
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_oldest() {
        let bus = NotificationBus::new(1);
        let mut rx = bus.subscribe();
        bus.device_details_changed();
        bus.user_details_changed();

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap(), Notification::UserDetailsChanged);
    }
}
