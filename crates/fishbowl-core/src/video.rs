//! Video types for fishbowl.
//!
//! Videos are owned by the catalog subsystem; the feed core only increments
//! the fish counter. Media URLs live in object storage and are out of scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{UserId, VideoId};

/// A video in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// The video ID.
    pub video_id: VideoId,

    /// The uploading user.
    pub owner_id: UserId,

    /// Display title.
    pub title: String,

    /// Free-form description.
    pub description: String,

    /// Number of fish this video has received. Monotonically non-decreasing;
    /// always equals the number of ledger entries referencing this video.
    pub fish_count: i64,

    /// Playback count.
    pub view_count: i64,

    /// When the video was uploaded.
    pub created_at: DateTime<Utc>,

    /// When the video was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Create a new video with zero counters.
    #[must_use]
    pub fn new(
        video_id: VideoId,
        owner_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            video_id,
            owner_id,
            title: title.into(),
            description: description.into(),
            fish_count: 0,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Denormalized read-optimized snapshot of a video, held in the detail cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDetail {
    /// The video ID.
    pub video_id: VideoId,

    /// The uploading user.
    pub owner_id: UserId,

    /// Uploader display name.
    pub uploader_nickname: String,

    /// Display title.
    pub title: String,

    /// Free-form description.
    pub description: String,

    /// Number of fish this video has received.
    pub fish_count: i64,

    /// Playback count.
    pub view_count: i64,
}

impl VideoDetail {
    /// Build a detail snapshot from a video and its uploader's display name.
    #[must_use]
    pub fn from_video(video: &Video, uploader_nickname: impl Into<String>) -> Self {
        Self {
            video_id: video.video_id,
            owner_id: video.owner_id,
            uploader_nickname: uploader_nickname.into(),
            title: video.title.clone(),
            description: video.description.clone(),
            fish_count: video.fish_count,
            view_count: video.view_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_snapshot_carries_counters() {
        let mut video = Video::new(VideoId::generate(), UserId::generate(), "Reef dive", "");
        video.fish_count = 7;
        video.view_count = 42;

        let detail = VideoDetail::from_video(&video, "Coral");
        assert_eq!(detail.fish_count, 7);
        assert_eq!(detail.view_count, 42);
        assert_eq!(detail.uploader_nickname, "Coral");
    }
}
