//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use fishbowl_core::FeedError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The spender's feed lock is held; the client should retry.
    #[error("busy, try again later")]
    Busy,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - duplicate feed or repeated daily claim.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient fish balance.
    #[error("insufficient fish: balance={balance}, required={required}")]
    InsufficientFish {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Busy => (
                StatusCode::TOO_MANY_REQUESTS,
                "busy",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientFish { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_fish",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Busy => Self::Busy,
            FeedError::InsufficientFunds { balance, required } => {
                Self::InsufficientFish { balance, required }
            }
            FeedError::AlreadyFed {
                spender_id,
                video_id,
            } => Self::Conflict(format!("user {spender_id} already fed video {video_id}")),
            FeedError::IdentityNotFound(id) => Self::NotFound(format!("user not found: {id}")),
            FeedError::TargetNotFound(id) => Self::NotFound(format!("video not found: {id}")),
            FeedError::AlreadyClaimed => {
                Self::Conflict("daily reward already claimed today".into())
            }
            FeedError::Storage(msg) => Self::Internal(msg),
            FeedError::InvalidId(e) => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<fishbowl_store::StoreError> for ApiError {
    fn from(err: fishbowl_store::StoreError) -> Self {
        match err {
            fishbowl_store::StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            fishbowl_store::StoreError::InsufficientFish { balance, required } => {
                Self::InsufficientFish { balance, required }
            }
            fishbowl_store::StoreError::DuplicateFeed {
                spender_id,
                video_id,
            } => Self::Conflict(format!("user {spender_id} already fed video {video_id}")),
            fishbowl_store::StoreError::Database(msg)
            | fishbowl_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
