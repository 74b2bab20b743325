//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families.

use fishbowl_core::{NotificationId, UserId, VideoId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a video key from a video ID.
#[must_use]
pub fn video_key(video_id: &VideoId) -> Vec<u8> {
    video_id.as_bytes().to_vec()
}

/// Create a feed-ledger key.
///
/// Format: `spender_id (16 bytes) || video_id (16 bytes)`
///
/// The key identifies the (spender, video) pair directly, so presence of the
/// key *is* the per-pair uniqueness constraint.
#[must_use]
pub fn feed_entry_key(spender_id: &UserId, video_id: &VideoId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(spender_id.as_bytes());
    key.extend_from_slice(video_id.as_bytes());
    key
}

/// Create a notification key from a notification ID.
#[must_use]
pub fn notification_key(notification_id: &NotificationId) -> Vec<u8> {
    notification_id.to_bytes().to_vec()
}

/// Create a recipient-notification index key.
///
/// Format: `recipient_id (16 bytes) || notification_id (16 bytes)`
///
/// Since ULIDs are time-ordered, a recipient's notifications sort by time.
#[must_use]
pub fn recipient_notification_key(
    recipient_id: &UserId,
    notification_id: &NotificationId,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(recipient_id.as_bytes());
    key.extend_from_slice(&notification_id.to_bytes());
    key
}

/// Create a prefix for iterating all notifications for a recipient.
#[must_use]
pub fn recipient_notifications_prefix(recipient_id: &UserId) -> Vec<u8> {
    recipient_id.as_bytes().to_vec()
}

/// Extract the notification ID from a recipient-notification index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_notification_id_from_recipient_key(key: &[u8]) -> NotificationId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    NotificationId::from_bytes(bytes).expect("valid ULID bytes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_length() {
        let user_id = UserId::generate();
        let key = account_key(&user_id);
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn feed_entry_key_format() {
        let spender = UserId::generate();
        let video = VideoId::generate();
        let key = feed_entry_key(&spender, &video);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], spender.as_bytes());
        assert_eq!(&key[16..], video.as_bytes());
    }

    #[test]
    fn feed_entry_key_is_pair_unique() {
        let spender = UserId::generate();
        let video_a = VideoId::generate();
        let video_b = VideoId::generate();

        assert_eq!(
            feed_entry_key(&spender, &video_a),
            feed_entry_key(&spender, &video_a)
        );
        assert_ne!(
            feed_entry_key(&spender, &video_a),
            feed_entry_key(&spender, &video_b)
        );
    }

    #[test]
    fn extract_notification_id_roundtrip() {
        let recipient = UserId::generate();
        let notification_id = NotificationId::generate();
        let key = recipient_notification_key(&recipient, &notification_id);

        let extracted = extract_notification_id_from_recipient_key(&key);
        assert_eq!(extracted, notification_id);
    }
}
