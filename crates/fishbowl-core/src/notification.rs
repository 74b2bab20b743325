//! Notification types.
//!
//! [`NotificationEvent`] is the transient wire shape carried over the message
//! channel; [`Notification`] is the persisted, user-visible record the
//! consumer creates from it. The two are deliberately separate: the event is
//! a serialization contract shared with other producers (e.g. the comment
//! surface), the record belongs to this system's storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NotificationId, UserId, VideoId};

/// The kind of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A video received a fish.
    #[serde(rename = "NEW_FISH")]
    NewFish,

    /// A video received a comment.
    #[serde(rename = "NEW_COMMENT")]
    NewComment,
}

/// Wire-format notification event.
///
/// Serialized as a JSON document with the exact field names `type`,
/// `senderId`, `recipientId`, `videoId`, `senderName`, `videoTitle`. This is
/// the contract every producer on the notification channel follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// The notification kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    /// The user who triggered the notification.
    pub sender_id: UserId,

    /// The user who will receive it (the video owner).
    pub recipient_id: UserId,

    /// The related video.
    pub video_id: VideoId,

    /// Sender display name, denormalized so the consumer needs no lookup.
    pub sender_name: String,

    /// Video title, denormalized for the same reason.
    pub video_title: String,
}

/// A persisted, user-visible notification.
///
/// Created by the consumer with `read = false`; the read flag is flipped
/// later by the notification-management surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Time-ordered notification ID.
    pub id: NotificationId,

    /// The recipient.
    pub recipient_id: UserId,

    /// The user who triggered it.
    pub sender_id: UserId,

    /// The notification kind.
    pub kind: NotificationKind,

    /// The related video.
    pub related_entity_id: VideoId,

    /// Rendered human-readable content.
    pub content: String,

    /// Whether the recipient has read it.
    pub read: bool,

    /// When the consumer persisted it.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build an unread notification from a wire event and rendered content.
    #[must_use]
    pub fn from_event(event: &NotificationEvent, content: String) -> Self {
        Self {
            id: NotificationId::generate(),
            recipient_id: event.recipient_id,
            sender_id: event.sender_id,
            kind: event.kind,
            related_entity_id: event.video_id,
            content,
            read: false,
            created_at: Utc::now(),
        }
    }
}
