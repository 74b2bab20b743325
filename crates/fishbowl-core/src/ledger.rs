//! Feed-ledger types.
//!
//! A ledger entry is the immutable, durable proof that a given spender has
//! fed a given video. At most one entry exists per (spender, video) pair;
//! the storage layer enforces this with a uniqueness constraint, which is the
//! system of record for "has this user already fed this video", independent
//! of the lock manager, so a lease expiry under load can never allow a
//! double-spend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::FEED_COST;
use crate::{EntryId, UserId, VideoId};

/// An immutable feed transaction record.
///
/// Created exactly once per successful feed; never updated or deleted by the
/// feed core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedLedgerEntry {
    /// Time-ordered entry ID.
    pub id: EntryId,

    /// The user who spent the fish.
    pub spender_id: UserId,

    /// The video that received it.
    pub video_id: VideoId,

    /// Fish spent. Always [`FEED_COST`]; bulk feeding is not supported.
    pub amount: i64,

    /// When the feed happened.
    pub created_at: DateTime<Utc>,
}

impl FeedLedgerEntry {
    /// Create a new single-fish ledger entry.
    #[must_use]
    pub fn new(spender_id: UserId, video_id: VideoId) -> Self {
        Self {
            id: EntryId::generate(),
            spender_id,
            video_id,
            amount: FEED_COST,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_amount_is_one_fish() {
        let entry = FeedLedgerEntry::new(UserId::generate(), VideoId::generate());
        assert_eq!(entry.amount, 1);
    }
}
