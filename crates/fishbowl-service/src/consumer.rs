//! Notification consumer.
//!
//! An always-on subscriber loop that drains the notification channel, renders
//! each event into a human-readable record, and persists it with
//! `read = false`. The consumer has no visibility into the originating feed
//! transaction, it trusts that a published event corresponds to a real state
//! change, and it never stops on a bad message: malformed or unprocessable
//! events are logged and dropped (poison handling).
//!
//! Redelivered events produce duplicate notification rows; that is the
//! documented at-least-once behavior, not a bug (see DESIGN.md).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use fishbowl_core::{Notification, NotificationEvent, NotificationKind};
use fishbowl_store::Store;

/// Render the user-visible content line for an event.
#[must_use]
pub fn render_content(event: &NotificationEvent) -> String {
    match event.kind {
        NotificationKind::NewComment => format!(
            "{} commented on your video: {}",
            event.sender_name, event.video_title
        ),
        NotificationKind::NewFish => format!(
            "Your video {} received a fish from {}",
            event.video_title, event.sender_name
        ),
    }
}

/// Maps channel payloads to persisted notification records.
pub struct NotificationConsumer {
    store: Arc<dyn Store>,
}

impl NotificationConsumer {
    /// Create a consumer writing to the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Spawn the consumer loop on an in-process channel.
    ///
    /// The task runs until every publisher handle is dropped and the channel
    /// drains, which ties consumer shutdown to process shutdown.
    #[must_use]
    pub fn spawn(self, rx: mpsc::UnboundedReceiver<Vec<u8>>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    /// Drain the channel until it closes.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
        tracing::info!("notification consumer started");

        while let Some(payload) = rx.recv().await {
            self.process(&payload);
        }

        tracing::info!("notification consumer stopped");
    }

    /// Process one channel payload. Failures are logged and the payload is
    /// dropped; this method never propagates an error to the loop.
    pub fn process(&self, payload: &[u8]) {
        let event: NotificationEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed notification event");
                return;
            }
        };

        let content = render_content(&event);
        let notification = Notification::from_event(&event, content);

        if let Err(e) = self.store.insert_notification(&notification) {
            tracing::error!(
                recipient_id = %event.recipient_id,
                video_id = %event.video_id,
                error = %e,
                "dropping notification event: persist failed"
            );
            return;
        }

        tracing::debug!(
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            "notification persisted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishbowl_core::{UserId, VideoId};
    use fishbowl_store::RocksStore;
    use tempfile::TempDir;

    fn create_test_store() -> (Arc<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        (store, dir)
    }

    fn fish_event(recipient_id: UserId) -> NotificationEvent {
        NotificationEvent {
            kind: NotificationKind::NewFish,
            sender_id: UserId::generate(),
            recipient_id,
            video_id: VideoId::generate(),
            sender_name: "Carp".into(),
            video_title: "Reef dive".into(),
        }
    }

    #[test]
    fn renders_both_kinds() {
        let mut event = fish_event(UserId::generate());
        assert_eq!(
            render_content(&event),
            "Your video Reef dive received a fish from Carp"
        );

        event.kind = NotificationKind::NewComment;
        assert_eq!(
            render_content(&event),
            "Carp commented on your video: Reef dive"
        );
    }

    #[test]
    fn event_becomes_unread_notification() {
        let (store, _dir) = create_test_store();
        let consumer = NotificationConsumer::new(store.clone());
        let recipient = UserId::generate();
        let event = fish_event(recipient);

        consumer.process(&serde_json::to_vec(&event).unwrap());

        let rows = store
            .list_notifications_by_recipient(&recipient, 10, 0)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].read);
        assert_eq!(rows[0].related_entity_id, event.video_id);
        assert_eq!(rows[0].content, "Your video Reef dive received a fish from Carp");
    }

    #[test]
    fn redelivery_produces_two_rows() {
        // Current at-least-once behavior: no consumer-side deduplication.
        // Whether duplicate notifications are acceptable product behavior is
        // an open question; this documents what the system does today.
        let (store, _dir) = create_test_store();
        let consumer = NotificationConsumer::new(store.clone());
        let recipient = UserId::generate();
        let payload = serde_json::to_vec(&fish_event(recipient)).unwrap();

        consumer.process(&payload);
        consumer.process(&payload);

        let rows = store
            .list_notifications_by_recipient(&recipient, 10, 0)
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn malformed_payload_is_dropped() {
        let (store, _dir) = create_test_store();
        let consumer = NotificationConsumer::new(store.clone());

        consumer.process(b"not json at all");

        // Nothing persisted, nothing panicked; the loop would keep running.
        let rows = store
            .list_notifications_by_recipient(&UserId::generate(), 10, 0)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn loop_drains_then_stops_on_channel_close() {
        let (store, _dir) = create_test_store();
        let recipient = UserId::generate();

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = NotificationConsumer::new(store.clone()).spawn(rx);

        tx.send(serde_json::to_vec(&fish_event(recipient)).unwrap())
            .unwrap();
        tx.send(b"poison".to_vec()).unwrap();
        tx.send(serde_json::to_vec(&fish_event(recipient)).unwrap())
            .unwrap();
        drop(tx);

        handle.await.unwrap();

        let rows = store
            .list_notifications_by_recipient(&recipient, 10, 0)
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
