//! Error types for fishbowl storage.

use fishbowl_core::FeedError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind ("account", "video", "notification").
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// Insufficient fish for the deduction.
    #[error("insufficient fish: balance={balance}, required={required}")]
    InsufficientFish {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The (spender, video) pair already has a ledger entry.
    ///
    /// This is the uniqueness constraint firing, the authoritative duplicate
    /// signal for the feed operation.
    #[error("duplicate feed: spender={spender_id}, video={video_id}")]
    DuplicateFeed {
        /// The spender.
        spender_id: String,
        /// The video.
        video_id: String,
    },
}

impl From<StoreError> for FeedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateFeed {
                spender_id,
                video_id,
            } => FeedError::AlreadyFed {
                spender_id,
                video_id,
            },
            StoreError::InsufficientFish { balance, required } => {
                FeedError::InsufficientFunds { balance, required }
            }
            StoreError::NotFound {
                entity: "account",
                id,
            } => FeedError::IdentityNotFound(id),
            StoreError::NotFound { entity: "video", id } => FeedError::TargetNotFound(id),
            other => FeedError::Storage(other.to_string()),
        }
    }
}
