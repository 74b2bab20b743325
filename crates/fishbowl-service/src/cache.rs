//! TTL-bound cache for video detail views.
//!
//! Keyed by `video-detail:<videoId>`, entries live for 30 minutes. The feed
//! transaction invalidates the target's entry synchronously before its lock
//! is released, so no reader observes the pre-feed counter indefinitely; a
//! crash between the storage commit and the invalidation is an accepted,
//! bounded staleness window.
//!
//! A miss is never cached: [`DetailCache::replace`] takes a view by value, so
//! there is no way to store "not found".

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use fishbowl_core::{VideoDetail, VideoId};

/// Default entry time-to-live.
pub const DETAIL_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// The cache key for a video's detail view.
#[must_use]
pub fn detail_cache_key(video_id: &VideoId) -> String {
    format!("video-detail:{video_id}")
}

struct CachedView {
    view: VideoDetail,
    inserted_at: Instant,
}

/// In-memory TTL cache of denormalized video detail snapshots.
pub struct DetailCache {
    entries: RwLock<HashMap<String, CachedView>>,
    ttl: Duration,
}

impl DetailCache {
    /// Create a cache with the default 30-minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DETAIL_CACHE_TTL)
    }

    /// Create a cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get the cached view for a video, if present and not expired.
    #[must_use]
    pub fn get(&self, video_id: &VideoId) -> Option<VideoDetail> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let cached = entries.get(&detail_cache_key(video_id))?;
        if cached.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(cached.view.clone())
    }

    /// Overwrite the cached view for the video the snapshot describes.
    pub fn replace(&self, view: VideoDetail) {
        let key = detail_cache_key(&view.video_id);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        entries.insert(
            key,
            CachedView {
                view,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Evict the cached view for a video. No-op if nothing is cached.
    pub fn invalidate(&self, video_id: &VideoId) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        entries.remove(&detail_cache_key(video_id));
    }
}

impl Default for DetailCache {
    fn default() -> Self {
        Self::new()
    }
}
