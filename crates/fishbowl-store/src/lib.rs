//! `RocksDB` storage layer for fishbowl.
//!
//! This crate provides persistent storage for accounts, videos, the feed
//! ledger, and notifications using `RocksDB` with column families.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: Account records, keyed by `user_id`
//! - `videos`: Video records, keyed by `video_id`
//! - `feed_ledger`: Ledger entries, keyed by `spender_id || video_id`;
//!   key presence is the durable per-pair uniqueness constraint
//! - `notifications`: Notification records, keyed by `notification_id` (ULID)
//! - `notifications_by_recipient`: Index for listing a recipient's notifications
//!
//! Compound operations ([`Store::record_feed`] in particular) perform their
//! reads and their atomic write batch under an internal mutation lock, so the
//! fish-counter increment is safe under concurrent writers in this process.
//!
//! # Example
//!
//! ```no_run
//! use fishbowl_store::{RocksStore, Store};
//! use fishbowl_core::{Account, UserId};
//!
//! let store = RocksStore::open("/tmp/fishbowl-db").unwrap();
//!
//! let user_id = UserId::generate();
//! let account = Account::new(user_id, "carp", "Carp");
//! store.put_account(&account).unwrap();
//!
//! let retrieved = store.get_account(&user_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::NaiveDate;
use fishbowl_core::{
    Account, FeedLedgerEntry, Notification, NotificationId, UserId, Video, VideoId,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, so orchestration code depends on
/// the contract rather than the `RocksDB` backend.
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>>;

    /// Set an account's fish balance and daily-claim marker together.
    ///
    /// Returns the new balance. This mirrors the single-row update the
    /// daily-reward claim performs: balance and marker change as one write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn update_fish(
        &self,
        user_id: &UserId,
        new_balance: i64,
        last_daily_claim: Option<NaiveDate>,
    ) -> Result<i64>;

    // =========================================================================
    // Video Operations
    // =========================================================================

    /// Insert or update a video record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_video(&self, video: &Video) -> Result<()>;

    /// Get a video by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_video(&self, video_id: &VideoId) -> Result<Option<Video>>;

    /// Increment a video's view counter, returning the new count.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the video doesn't exist.
    fn increment_view_count(&self, video_id: &VideoId) -> Result<i64>;

    // =========================================================================
    // Feed Ledger Operations
    // =========================================================================

    /// Check whether a (spender, video) ledger entry already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_fed(&self, spender_id: &UserId, video_id: &VideoId) -> Result<bool>;

    /// Get the ledger entry for a (spender, video) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_feed_entry(
        &self,
        spender_id: &UserId,
        video_id: &VideoId,
    ) -> Result<Option<FeedLedgerEntry>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Record a feed: insert the ledger entry, debit the spender, and credit
    /// the video counter in one atomic batch.
    ///
    /// Returns the spender's new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateFeed` if the (spender, video) pair already has
    ///   an entry, the authoritative idempotence signal.
    /// - `StoreError::NotFound` if the account or video doesn't exist.
    /// - `StoreError::InsufficientFish` if the balance is below the amount.
    ///
    /// On any error, nothing is written.
    fn record_feed(&self, entry: &FeedLedgerEntry) -> Result<i64>;

    // =========================================================================
    // Notification Operations
    // =========================================================================

    /// Insert a notification record and its recipient index entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_notification(&self, notification: &Notification) -> Result<()>;

    /// Get a notification by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_notification(&self, notification_id: &NotificationId) -> Result<Option<Notification>>;

    /// List notifications for a recipient, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_notifications_by_recipient(
        &self,
        recipient_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>>;

    /// Mark a single notification as read.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the notification doesn't exist.
    fn mark_notification_read(&self, notification_id: &NotificationId) -> Result<()>;

    /// Mark all of a recipient's notifications as read, returning how many
    /// were updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn mark_all_read(&self, recipient_id: &UserId) -> Result<u64>;
}
