//! Notification channel abstraction.
//!
//! The feed transaction hands notification events to a channel and moves on;
//! the consumer drains the channel independently. Delivery is at-least-once:
//! a broker-level redelivery can hand the consumer the same event twice, and
//! the consumer does not deduplicate.
//!
//! Events travel as serialized JSON documents, even in-process, so the wire
//! contract (`type`, `senderId`, `recipientId`, `videoId`, `senderName`,
//! `videoTitle`) is exercised on every path.

use async_trait::async_trait;
use tokio::sync::mpsc;

use fishbowl_core::NotificationEvent;

/// Errors from publishing to the notification channel.
///
/// These are contained at the feed boundary: a failed publish is logged and
/// never rolls back the committed feed transaction.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The channel is closed (consumer gone, process shutting down).
    #[error("notification channel closed")]
    Closed,

    /// The broker rejected the event or timed out.
    #[error("broker error: {0}")]
    Broker(String),

    /// Event serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Producer side of the notification channel.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Serialize the event and hand it to the channel, returning once the
    /// channel has accepted it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the channel rejects the
    /// event.
    async fn publish(&self, event: &NotificationEvent) -> Result<(), PublishError>;
}

/// In-process channel backed by an unbounded tokio mpsc queue.
///
/// The default backend for single-node deployments and tests. The `nats`
/// feature provides a broker-backed alternative with the same contract.
pub struct InProcessChannel {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl InProcessChannel {
    /// Create the channel, returning the publisher and the consumer's
    /// receiving end.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationPublisher for InProcessChannel {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), PublishError> {
        let payload =
            serde_json::to_vec(event).map_err(|e| PublishError::Serialization(e.to_string()))?;

        self.tx.send(payload).map_err(|_| PublishError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishbowl_core::{NotificationKind, UserId, VideoId};

    fn sample_event() -> NotificationEvent {
        NotificationEvent {
            kind: NotificationKind::NewFish,
            sender_id: UserId::generate(),
            recipient_id: UserId::generate(),
            video_id: VideoId::generate(),
            sender_name: "Carp".into(),
            video_title: "Reef dive".into(),
        }
    }

    #[tokio::test]
    async fn publish_delivers_wire_payload() {
        let (channel, mut rx) = InProcessChannel::new();
        let event = sample_event();

        channel.publish(&event).await.unwrap();

        let payload = rx.recv().await.unwrap();
        let parsed: NotificationEvent = serde_json::from_slice(&payload).unwrap();
        assert_eq!(parsed, event);
    }

    #[tokio::test]
    async fn publish_after_consumer_gone_is_closed() {
        let (channel, rx) = InProcessChannel::new();
        drop(rx);

        let result = channel.publish(&sample_event()).await;
        assert!(matches!(result, Err(PublishError::Closed)));
    }
}
