//! Video detail handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use fishbowl_core::{VideoDetail, VideoId};

use crate::error::ApiError;
use crate::state::AppState;

/// Get a video's detail view, counting the playback.
///
/// `GET /v1/videos/:video_id`
///
/// Served through the detail cache; the view counter always advances but a
/// cache hit may return counts up to the TTL stale. Feeding the video
/// invalidates its cached view.
pub async fn get_video_detail(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<VideoId>,
) -> Result<Json<VideoDetail>, ApiError> {
    let detail = state.feed.video_detail(&video_id)?;
    Ok(Json(detail))
}
