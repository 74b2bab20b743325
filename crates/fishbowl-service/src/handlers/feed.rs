//! Feed transaction and fish balance handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use fishbowl_core::{UserId, VideoId};
use fishbowl_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body identifying the acting user.
///
/// The identity subsystem normally supplies this from the session; here it
/// travels in the body.
#[derive(Debug, Deserialize)]
pub struct ActingUser {
    /// The user performing the action.
    pub user_id: UserId,
}

/// Fish balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// The user's fish balance after the operation.
    pub fish_balance: i64,
}

/// Feed one fish to a video.
///
/// `POST /v1/videos/:video_id/feed`
pub async fn feed_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<VideoId>,
    Json(body): Json<ActingUser>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let fish_balance = state.feed.feed(body.user_id, video_id).await?;
    Ok(Json(BalanceResponse { fish_balance }))
}

/// Claim the daily fish reward.
///
/// `POST /v1/fish/claim`
pub async fn claim_daily(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActingUser>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let fish_balance = state.feed.claim_daily(body.user_id).await?;
    Ok(Json(BalanceResponse { fish_balance }))
}

/// Get a user's current fish balance.
///
/// `GET /v1/users/:user_id/fish`
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .store
        .get_account(&user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?;

    Ok(Json(BalanceResponse {
        fish_balance: account.fish_balance,
    }))
}
