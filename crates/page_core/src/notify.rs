use shared::{domain::NotificationKind, protocol::Notification};
use tokio::sync::broadcast;
use tracing::{info, warn};

const NOTIFICATION_CAPACITY: usize = 32;

/// Transient toast surface. Rendering happens elsewhere.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(
                title = %notification.title,
                description = %notification.description,
                "toast"
            ),
            NotificationKind::Error => warn!(
                title = %notification.title,
                description = %notification.description,
                "toast"
            ),
        }
    }
}

/// Fans notifications out to any number of toast renderers.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}
