//! Error types for the feed core.

use crate::ids::IdError;

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Errors surfaced by the fish-feed operation.
///
/// Steps before the storage commit are fail-fast and return one of these
/// synchronously. Notification publish failures are deliberately *not* part
/// of this taxonomy: delivery is best-effort and never fails the operation.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The spender's lock could not be acquired within the wait window.
    /// Transient: the caller should retry later. Nothing was mutated.
    #[error("feed lock busy, try again later")]
    Busy,

    /// The spender's balance is below the feed cost. Terminal for this call.
    #[error("insufficient fish: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// This spender has already fed this video. Detected by the storage
    /// uniqueness constraint, which is authoritative even if a lock lease
    /// expired mid-operation. Terminal, never retried.
    #[error("already fed: spender={spender_id}, video={video_id}")]
    AlreadyFed {
        /// The spender.
        spender_id: String,
        /// The video.
        video_id: String,
    },

    /// The spending user does not exist.
    #[error("user not found: {0}")]
    IdentityNotFound(String),

    /// The target video does not exist.
    #[error("video not found: {0}")]
    TargetNotFound(String),

    /// The daily reward was already claimed today.
    #[error("daily reward already claimed today")]
    AlreadyClaimed,

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
