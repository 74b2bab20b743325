//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Video records, keyed by `video_id`.
    pub const VIDEOS: &str = "videos";

    /// Feed-ledger entries, keyed by `spender_id || video_id`.
    /// Key presence is the per-pair uniqueness constraint.
    pub const FEED_LEDGER: &str = "feed_ledger";

    /// Notification records, keyed by `notification_id` (ULID).
    pub const NOTIFICATIONS: &str = "notifications";

    /// Index: notifications by recipient, keyed by
    /// `recipient_id || notification_id`. Value is empty (index only).
    pub const NOTIFICATIONS_BY_RECIPIENT: &str = "notifications_by_recipient";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::VIDEOS,
        cf::FEED_LEDGER,
        cf::NOTIFICATIONS,
        cf::NOTIFICATIONS_BY_RECIPIENT,
    ]
}
