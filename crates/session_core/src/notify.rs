use std::sync::Arc;

use core_types::{NOTIFICATION_TTL, Notification};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Single-slot transient messaging. Success and error are mutually
/// exclusive: raising either kind replaces whatever was active and
/// cancels its pending expiry. An active notification clears itself
/// after `NOTIFICATION_TTL` unless superseded first.
#[derive(Clone, Default)]
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    active: Option<Notification>,
    expiry: Option<JoinHandle<()>>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(handle) = self.expiry.take() {
            handle.abort();
        }
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.raise(Notification::success(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.raise(Notification::error(message));
    }

    fn raise(&self, notification: Notification) {
        let mut slot = self.slot.lock();
        if let Some(handle) = slot.expiry.take() {
            handle.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;
        slot.active = Some(notification);

        let shared = Arc::clone(&self.slot);
        slot.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(NOTIFICATION_TTL).await;
            let mut slot = shared.lock();
            // a newer notification may own the slot by now
            if slot.generation == generation {
                slot.active = None;
                slot.expiry = None;
            }
        }));
    }

    pub fn current(&self) -> Option<Notification> {
        self.slot.lock().active.clone()
    }

    /// Clears the slot and cancels any pending expiry.
    pub fn clear(&self) {
        let mut slot = self.slot.lock();
        if let Some(handle) = slot.expiry.take() {
            handle.abort();
        }
        slot.generation += 1;
        slot.active = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use core_types::NotificationKind;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn error_supersedes_success() {
        let notifier = Notifier::new();
        notifier.success("ok");
        notifier.error("bad");

        let active = notifier.current().expect("active notification");
        assert_eq!(active.kind, NotificationKind::Error);
        assert_eq!(active.message, "bad");
    }

    #[tokio::test(start_paused = true)]
    async fn notification_expires_on_its_own() {
        let notifier = Notifier::new();
        notifier.success("uploaded");
        assert!(notifier.current().is_some());

        tokio::time::sleep(NOTIFICATION_TTL + Duration::from_secs(1)).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_restarts_the_expiry_clock() {
        let notifier = Notifier::new();
        notifier.success("first");
        tokio::time::sleep(Duration::from_secs(3)).await;

        notifier.error("second");
        // past the first notification's deadline, not the second's
        tokio::time::sleep(Duration::from_secs(3)).await;
        let active = notifier.current().expect("second still active");
        assert_eq!(active.message, "second");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_pending_expiry() {
        let notifier = Notifier::new();
        notifier.success("soon gone");
        notifier.clear();
        assert!(notifier.current().is_none());

        notifier.error("fresh");
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(notifier.current().is_some());
    }
}
