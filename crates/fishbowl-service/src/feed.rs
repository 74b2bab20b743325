//! The fish-feed transaction and its sibling fish operations.
//!
//! [`FeedService::feed`] is the one place where concurrent requests contend
//! over shared mutable state: the spender's balance, the per-pair ledger
//! constraint, and the cached detail view. Everything it does happens while
//! holding the spender-scoped lock; the storage layer's uniqueness constraint
//! is the second, independent guard for the moment a lease expires under
//! load.

use std::sync::Arc;
use std::time::Duration;

use fishbowl_core::{
    FeedError, FeedLedgerEntry, NotificationEvent, NotificationKind, UserId, VideoDetail, VideoId,
    DAILY_REWARD_FISH, FEED_COST,
};
use fishbowl_store::Store;

use crate::cache::DetailCache;
use crate::channel::NotificationPublisher;
use crate::lock::{feed_lock_key, LeaseLockManager, DEFAULT_LEASE_TIMEOUT, DEFAULT_WAIT_TIMEOUT};

/// Orchestrates feed transactions, daily reward claims, and the cached
/// detail-view read path.
pub struct FeedService {
    store: Arc<dyn Store>,
    locks: Arc<LeaseLockManager>,
    cache: Arc<DetailCache>,
    publisher: Arc<dyn NotificationPublisher>,
    lock_wait: Duration,
    lock_lease: Duration,
}

impl FeedService {
    /// Create the service with default lock timeouts.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        locks: Arc<LeaseLockManager>,
        cache: Arc<DetailCache>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            store,
            locks,
            cache,
            publisher,
            lock_wait: DEFAULT_WAIT_TIMEOUT,
            lock_lease: DEFAULT_LEASE_TIMEOUT,
        }
    }

    /// Override the lock wait/lease timeouts (used by tests and config).
    #[must_use]
    pub fn with_lock_timeouts(mut self, wait: Duration, lease: Duration) -> Self {
        self.lock_wait = wait;
        self.lock_lease = lease;
        self
    }

    /// Feed one fish from `spender_id` to `video_id`.
    ///
    /// Returns the spender's new balance. On success the ledger entry,
    /// balance debit, and counter credit have committed atomically, the
    /// cached detail view is invalidated, and, unless the spender owns the
    /// video, one notification publish was attempted. A publish failure is
    /// logged and swallowed: the committed transaction is the economically
    /// significant event and is never reverted for a delivery-layer failure.
    ///
    /// # Errors
    ///
    /// - `FeedError::Busy`: lock not acquired in time; retry later, nothing
    ///   was mutated.
    /// - `FeedError::IdentityNotFound` / `FeedError::TargetNotFound`
    /// - `FeedError::InsufficientFunds`: balance below [`FEED_COST`].
    /// - `FeedError::AlreadyFed`: the (spender, video) pair already has a
    ///   ledger entry.
    pub async fn feed(&self, spender_id: UserId, video_id: VideoId) -> Result<i64, FeedError> {
        let key = feed_lock_key(&spender_id);
        let guard = self
            .locks
            .acquire(&key, self.lock_wait, self.lock_lease)
            .await
            .map_err(|_| FeedError::Busy)?;

        // The guard also releases on drop, covering every error path below.
        let result = self.feed_locked(spender_id, video_id).await;
        guard.release();
        result
    }

    async fn feed_locked(&self, spender_id: UserId, video_id: VideoId) -> Result<i64, FeedError> {
        let account = self
            .store
            .get_account(&spender_id)?
            .ok_or_else(|| FeedError::IdentityNotFound(spender_id.to_string()))?;

        let video = self
            .store
            .get_video(&video_id)?
            .ok_or_else(|| FeedError::TargetNotFound(video_id.to_string()))?;

        // Checked under the lock, not optimistically: two requests must not
        // both read a pre-decrement balance of 1 and both pass.
        if account.fish_balance < FEED_COST {
            return Err(FeedError::InsufficientFunds {
                balance: account.fish_balance,
                required: FEED_COST,
            });
        }

        // Ledger insert + debit + counter credit, one atomic batch. The
        // duplicate-pair rejection surfacing here is authoritative even if
        // our lease expired and another holder raced us.
        let entry = FeedLedgerEntry::new(spender_id, video_id);
        let new_balance = self.store.record_feed(&entry)?;

        // Before the lock is released, so no reader holds a pre-feed view
        // past this operation.
        self.cache.invalidate(&video_id);

        tracing::info!(
            spender_id = %spender_id,
            video_id = %video_id,
            new_balance = %new_balance,
            "fish fed"
        );

        if spender_id != video.owner_id {
            let event = NotificationEvent {
                kind: NotificationKind::NewFish,
                sender_id: spender_id,
                recipient_id: video.owner_id,
                video_id,
                sender_name: account.nickname,
                video_title: video.title,
            };

            if let Err(e) = self.publisher.publish(&event).await {
                tracing::warn!(
                    spender_id = %spender_id,
                    video_id = %video_id,
                    error = %e,
                    "notification publish failed; feed already committed"
                );
            }
        }

        Ok(new_balance)
    }

    /// Claim the once-per-day fish reward for `user_id`.
    ///
    /// Returns the new balance. Uses the same spender-scoped lock as the feed
    /// operation, since both mutate the same balance.
    ///
    /// # Errors
    ///
    /// - `FeedError::Busy`: lock not acquired in time.
    /// - `FeedError::IdentityNotFound`
    /// - `FeedError::AlreadyClaimed`: already claimed today.
    pub async fn claim_daily(&self, user_id: UserId) -> Result<i64, FeedError> {
        let key = feed_lock_key(&user_id);
        let _guard = self
            .locks
            .acquire(&key, self.lock_wait, self.lock_lease)
            .await
            .map_err(|_| FeedError::Busy)?;

        let account = self
            .store
            .get_account(&user_id)?
            .ok_or_else(|| FeedError::IdentityNotFound(user_id.to_string()))?;

        let today = chrono::Utc::now().date_naive();
        if !account.can_claim_daily(today) {
            return Err(FeedError::AlreadyClaimed);
        }

        let new_balance = self.store.update_fish(
            &user_id,
            account.fish_balance + DAILY_REWARD_FISH,
            Some(today),
        )?;

        tracing::info!(user_id = %user_id, new_balance = %new_balance, "daily fish claimed");
        Ok(new_balance)
    }

    /// Read a video's detail view through the cache, counting the playback.
    ///
    /// Cache-aside: a hit returns the cached snapshot (its view counter may
    /// lag within the TTL), a miss rebuilds the snapshot from storage and
    /// caches it. A missing video is never cached.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::TargetNotFound` if the video doesn't exist.
    pub fn video_detail(&self, video_id: &VideoId) -> Result<VideoDetail, FeedError> {
        // Every playback counts, cached or not.
        self.store.increment_view_count(video_id)?;

        if let Some(view) = self.cache.get(video_id) {
            return Ok(view);
        }

        let video = self
            .store
            .get_video(video_id)?
            .ok_or_else(|| FeedError::TargetNotFound(video_id.to_string()))?;

        let uploader_nickname = self
            .store
            .get_account(&video.owner_id)?
            .map_or_else(String::new, |owner| owner.nickname);

        let detail = VideoDetail::from_video(&video, uploader_nickname);
        self.cache.replace(detail.clone());
        Ok(detail)
    }
}
