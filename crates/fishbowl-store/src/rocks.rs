//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use chrono::NaiveDate;
use fishbowl_core::{
    Account, FeedLedgerEntry, Notification, NotificationId, UserId, Video, VideoId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes compound read-modify-write operations so counters never
    /// lose concurrent increments. Held only across in-memory work plus one
    /// batch write; never across I/O waits.
    mutation: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            mutation: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Acquire the mutation gate for a compound read-modify-write.
    fn gate(&self) -> Result<MutexGuard<'_, ()>> {
        self.mutation
            .lock()
            .map_err(|_| StoreError::Database("mutation lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn update_fish(
        &self,
        user_id: &UserId,
        new_balance: i64,
        last_daily_claim: Option<NaiveDate>,
    ) -> Result<i64> {
        let _gate = self.gate()?;

        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound {
            entity: "account",
            id: user_id.to_string(),
        })?;

        account.fish_balance = new_balance;
        account.last_daily_claim = last_daily_claim;
        account.updated_at = chrono::Utc::now();

        let value = Self::serialize(&account)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(account.fish_balance)
    }

    // =========================================================================
    // Video Operations
    // =========================================================================

    fn put_video(&self, video: &Video) -> Result<()> {
        let cf = self.cf(cf::VIDEOS)?;
        let key = keys::video_key(&video.video_id);
        let value = Self::serialize(video)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_video(&self, video_id: &VideoId) -> Result<Option<Video>> {
        let cf = self.cf(cf::VIDEOS)?;
        let key = keys::video_key(video_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn increment_view_count(&self, video_id: &VideoId) -> Result<i64> {
        let _gate = self.gate()?;

        let cf = self.cf(cf::VIDEOS)?;
        let key = keys::video_key(video_id);

        let mut video = self.get_video(video_id)?.ok_or(StoreError::NotFound {
            entity: "video",
            id: video_id.to_string(),
        })?;

        video.view_count += 1;
        video.updated_at = chrono::Utc::now();

        let value = Self::serialize(&video)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(video.view_count)
    }

    // =========================================================================
    // Feed Ledger Operations
    // =========================================================================

    fn has_fed(&self, spender_id: &UserId, video_id: &VideoId) -> Result<bool> {
        let cf = self.cf(cf::FEED_LEDGER)?;
        let key = keys::feed_entry_key(spender_id, video_id);

        let exists = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();

        Ok(exists)
    }

    fn get_feed_entry(
        &self,
        spender_id: &UserId,
        video_id: &VideoId,
    ) -> Result<Option<FeedLedgerEntry>> {
        let cf = self.cf(cf::FEED_LEDGER)?;
        let key = keys::feed_entry_key(spender_id, video_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn record_feed(&self, entry: &FeedLedgerEntry) -> Result<i64> {
        let _gate = self.gate()?;

        // The uniqueness constraint: one ledger entry per (spender, video).
        if self.has_fed(&entry.spender_id, &entry.video_id)? {
            return Err(StoreError::DuplicateFeed {
                spender_id: entry.spender_id.to_string(),
                video_id: entry.video_id.to_string(),
            });
        }

        let mut account = self
            .get_account(&entry.spender_id)?
            .ok_or(StoreError::NotFound {
                entity: "account",
                id: entry.spender_id.to_string(),
            })?;

        if account.fish_balance < entry.amount {
            return Err(StoreError::InsufficientFish {
                balance: account.fish_balance,
                required: entry.amount,
            });
        }

        let mut video = self.get_video(&entry.video_id)?.ok_or(StoreError::NotFound {
            entity: "video",
            id: entry.video_id.to_string(),
        })?;

        let now = chrono::Utc::now();
        account.fish_balance -= entry.amount;
        account.updated_at = now;
        video.fish_count += entry.amount;
        video.updated_at = now;

        let cf_ledger = self.cf(cf::FEED_LEDGER)?;
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_videos = self.cf(cf::VIDEOS)?;

        let entry_key = keys::feed_entry_key(&entry.spender_id, &entry.video_id);
        let account_key = keys::account_key(&entry.spender_id);
        let video_key = keys::video_key(&entry.video_id);

        let entry_value = Self::serialize(entry)?;
        let account_value = Self::serialize(&account)?;
        let video_value = Self::serialize(&video)?;

        // Ledger insert, balance debit, and counter credit commit together.
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_ledger, &entry_key, &entry_value);
        batch.put_cf(&cf_accounts, &account_key, &account_value);
        batch.put_cf(&cf_videos, &video_key, &video_value);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(
            spender_id = %entry.spender_id,
            video_id = %entry.video_id,
            new_balance = account.fish_balance,
            fish_count = video.fish_count,
            "Feed recorded"
        );

        Ok(account.fish_balance)
    }

    // =========================================================================
    // Notification Operations
    // =========================================================================

    fn insert_notification(&self, notification: &Notification) -> Result<()> {
        let cf_notifications = self.cf(cf::NOTIFICATIONS)?;
        let cf_by_recipient = self.cf(cf::NOTIFICATIONS_BY_RECIPIENT)?;

        let notification_key = keys::notification_key(&notification.id);
        let recipient_key =
            keys::recipient_notification_key(&notification.recipient_id, &notification.id);
        let value = Self::serialize(notification)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_notifications, &notification_key, &value);
        batch.put_cf(&cf_by_recipient, &recipient_key, b""); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_notification(&self, notification_id: &NotificationId) -> Result<Option<Notification>> {
        let cf = self.cf(cf::NOTIFICATIONS)?;
        let key = keys::notification_key(notification_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_notifications_by_recipient(
        &self,
        recipient_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>> {
        let cf_by_recipient = self.cf(cf::NOTIFICATIONS_BY_RECIPIENT)?;
        let prefix = keys::recipient_notifications_prefix(recipient_id);

        // Index keys are `recipient_id || ulid` and ULIDs are time-ordered,
        // so the newest entry is the largest key under the prefix. Seek to
        // the prefix's upper bound and walk backwards; a page then reads
        // only offset + limit index entries, not the recipient's whole
        // history.
        let mut upper = prefix.clone();
        upper.extend_from_slice(&[0xFF; 16]);

        let iter = self.db.iterator_cf(
            &cf_by_recipient,
            IteratorMode::From(&upper, rocksdb::Direction::Reverse),
        );

        let mut notifications = Vec::new();
        let mut skipped = 0;

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            if skipped < offset {
                skipped += 1;
                continue;
            }

            if notifications.len() >= limit {
                break;
            }

            let notification_id = keys::extract_notification_id_from_recipient_key(&key);
            if let Some(notification) = self.get_notification(&notification_id)? {
                notifications.push(notification);
            }
        }

        Ok(notifications)
    }

    fn mark_notification_read(&self, notification_id: &NotificationId) -> Result<()> {
        let _gate = self.gate()?;

        let cf = self.cf(cf::NOTIFICATIONS)?;
        let key = keys::notification_key(notification_id);

        let mut notification =
            self.get_notification(notification_id)?
                .ok_or(StoreError::NotFound {
                    entity: "notification",
                    id: notification_id.to_string(),
                })?;

        notification.read = true;

        let value = Self::serialize(&notification)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn mark_all_read(&self, recipient_id: &UserId) -> Result<u64> {
        let _gate = self.gate()?;

        let cf_notifications = self.cf(cf::NOTIFICATIONS)?;
        let cf_by_recipient = self.cf(cf::NOTIFICATIONS_BY_RECIPIENT)?;
        let prefix = keys::recipient_notifications_prefix(recipient_id);

        let iter = self.db.iterator_cf(
            &cf_by_recipient,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut batch = WriteBatch::default();
        let mut updated = 0u64;

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let notification_id = keys::extract_notification_id_from_recipient_key(&key);
            let Some(mut notification) = self.get_notification(&notification_id)? else {
                continue;
            };

            if notification.read {
                continue;
            }

            notification.read = true;
            let value = Self::serialize(&notification)?;
            batch.put_cf(
                &cf_notifications,
                keys::notification_key(&notification_id),
                &value,
            );
            updated += 1;
        }

        if updated > 0 {
            self.db
                .write(batch)
                .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishbowl_core::{NotificationEvent, NotificationKind};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn funded_account(store: &RocksStore, balance: i64) -> UserId {
        let user_id = UserId::generate();
        let mut account = Account::new(user_id, "carp", "Carp");
        account.fish_balance = balance;
        store.put_account(&account).unwrap();
        user_id
    }

    fn uploaded_video(store: &RocksStore, owner_id: UserId) -> VideoId {
        let video_id = VideoId::generate();
        let video = Video::new(video_id, owner_id, "Reef dive", "A dive on the reef");
        store.put_video(&video).unwrap();
        video_id
    }

    fn sample_notification(recipient_id: UserId) -> Notification {
        let event = NotificationEvent {
            kind: NotificationKind::NewFish,
            sender_id: UserId::generate(),
            recipient_id,
            video_id: VideoId::generate(),
            sender_name: "Carp".into(),
            video_title: "Reef dive".into(),
        };
        Notification::from_event(&event, "content".into())
    }

    #[test]
    fn account_crud() {
        let (store, _dir) = create_test_store();
        let user_id = funded_account(&store, 50);

        let retrieved = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(retrieved.fish_balance, 50);

        let today = chrono::Utc::now().date_naive();
        let balance = store.update_fish(&user_id, 60, Some(today)).unwrap();
        assert_eq!(balance, 60);

        let updated = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(updated.fish_balance, 60);
        assert_eq!(updated.last_daily_claim, Some(today));
    }

    #[test]
    fn record_feed_debits_and_credits_together() {
        let (store, _dir) = create_test_store();
        let spender = funded_account(&store, 5);
        let owner = funded_account(&store, 0);
        let video_id = uploaded_video(&store, owner);

        let entry = FeedLedgerEntry::new(spender, video_id);
        let balance = store.record_feed(&entry).unwrap();
        assert_eq!(balance, 4);

        let account = store.get_account(&spender).unwrap().unwrap();
        let video = store.get_video(&video_id).unwrap().unwrap();
        assert_eq!(account.fish_balance, 4);
        assert_eq!(video.fish_count, 1);
        assert!(store.has_fed(&spender, &video_id).unwrap());

        let stored = store.get_feed_entry(&spender, &video_id).unwrap().unwrap();
        assert_eq!(stored.id, entry.id);
        assert_eq!(stored.amount, 1);
    }

    #[test]
    fn record_feed_rejects_duplicate_pair() {
        let (store, _dir) = create_test_store();
        let spender = funded_account(&store, 5);
        let owner = funded_account(&store, 0);
        let video_id = uploaded_video(&store, owner);

        store
            .record_feed(&FeedLedgerEntry::new(spender, video_id))
            .unwrap();

        // A fresh entry for the same pair must hit the constraint.
        let result = store.record_feed(&FeedLedgerEntry::new(spender, video_id));
        assert!(matches!(result, Err(StoreError::DuplicateFeed { .. })));

        // First feed's effects are intact, not doubled.
        let account = store.get_account(&spender).unwrap().unwrap();
        let video = store.get_video(&video_id).unwrap().unwrap();
        assert_eq!(account.fish_balance, 4);
        assert_eq!(video.fish_count, 1);
    }

    #[test]
    fn record_feed_insufficient_fish_mutates_nothing() {
        let (store, _dir) = create_test_store();
        let spender = funded_account(&store, 0);
        let owner = funded_account(&store, 0);
        let video_id = uploaded_video(&store, owner);

        let result = store.record_feed(&FeedLedgerEntry::new(spender, video_id));
        assert!(matches!(
            result,
            Err(StoreError::InsufficientFish {
                balance: 0,
                required: 1
            })
        ));

        let account = store.get_account(&spender).unwrap().unwrap();
        let video = store.get_video(&video_id).unwrap().unwrap();
        assert_eq!(account.fish_balance, 0);
        assert_eq!(video.fish_count, 0);
        assert!(!store.has_fed(&spender, &video_id).unwrap());
    }

    #[test]
    fn record_feed_missing_video_mutates_nothing() {
        let (store, _dir) = create_test_store();
        let spender = funded_account(&store, 5);
        let missing = VideoId::generate();

        let result = store.record_feed(&FeedLedgerEntry::new(spender, missing));
        assert!(matches!(
            result,
            Err(StoreError::NotFound { entity: "video", .. })
        ));

        let account = store.get_account(&spender).unwrap().unwrap();
        assert_eq!(account.fish_balance, 5);
        assert!(!store.has_fed(&spender, &missing).unwrap());
    }

    #[test]
    fn concurrent_feeds_never_lose_counter_increments() {
        let (store, _dir) = create_test_store();
        let store = std::sync::Arc::new(store);
        let owner = funded_account(&store, 0);
        let video_id = uploaded_video(&store, owner);

        let spenders: Vec<UserId> = (0..8).map(|_| funded_account(&store, 1)).collect();

        let handles: Vec<_> = spenders
            .into_iter()
            .map(|spender| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.record_feed(&FeedLedgerEntry::new(spender, video_id))
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let video = store.get_video(&video_id).unwrap().unwrap();
        assert_eq!(video.fish_count, 8);
    }

    #[test]
    fn view_count_increments() {
        let (store, _dir) = create_test_store();
        let owner = funded_account(&store, 0);
        let video_id = uploaded_video(&store, owner);

        assert_eq!(store.increment_view_count(&video_id).unwrap(), 1);
        assert_eq!(store.increment_view_count(&video_id).unwrap(), 2);
    }

    #[test]
    fn notification_listing_newest_first() {
        let (store, _dir) = create_test_store();
        let recipient = UserId::generate();

        let first = sample_notification(recipient);
        store.insert_notification(&first).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs

        let second = sample_notification(recipient);
        store.insert_notification(&second).unwrap();

        let listed = store
            .list_notifications_by_recipient(&recipient, 10, 0)
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id); // Newest first
        assert_eq!(listed[1].id, first.id);

        // Pagination
        let page2 = store
            .list_notifications_by_recipient(&recipient, 1, 1)
            .unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].id, first.id);
    }

    #[test]
    fn notification_listing_stays_within_recipient_prefix() {
        let (store, _dir) = create_test_store();
        let recipient = UserId::generate();
        let neighbor = UserId::generate();

        // Interleave inserts for two recipients so their index keys are
        // adjacent in the column family.
        let mut mine = Vec::new();
        for _ in 0..3 {
            let n = sample_notification(recipient);
            store.insert_notification(&n).unwrap();
            mine.push(n.id);
            store
                .insert_notification(&sample_notification(neighbor))
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        // The reverse walk must stop at the recipient's prefix boundary.
        let listed = store
            .list_notifications_by_recipient(&recipient, 10, 0)
            .unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|n| n.recipient_id == recipient));
        assert_eq!(listed[0].id, mine[2]); // Newest first
        assert_eq!(listed[2].id, mine[0]);

        // Offset paging from the newest end.
        let page = store
            .list_notifications_by_recipient(&recipient, 10, 2)
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, mine[0]);

        // Offset past the end, and a recipient with no entries.
        assert!(store
            .list_notifications_by_recipient(&recipient, 10, 3)
            .unwrap()
            .is_empty());
        assert!(store
            .list_notifications_by_recipient(&UserId::generate(), 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn mark_read_flows() {
        let (store, _dir) = create_test_store();
        let recipient = UserId::generate();

        let a = sample_notification(recipient);
        let b = sample_notification(recipient);
        store.insert_notification(&a).unwrap();
        store.insert_notification(&b).unwrap();

        store.mark_notification_read(&a.id).unwrap();
        assert!(store.get_notification(&a.id).unwrap().unwrap().read);
        assert!(!store.get_notification(&b.id).unwrap().unwrap().read);

        let updated = store.mark_all_read(&recipient).unwrap();
        assert_eq!(updated, 1); // Only b was still unread
        assert!(store.get_notification(&b.id).unwrap().unwrap().read);
    }

    #[test]
    fn mark_read_missing_notification() {
        let (store, _dir) = create_test_store();
        let result = store.mark_notification_read(&NotificationId::generate());
        assert!(matches!(
            result,
            Err(StoreError::NotFound {
                entity: "notification",
                ..
            })
        ));
    }
}
