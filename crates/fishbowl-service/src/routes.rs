//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{feed, health, notifications, videos};
use crate::state::AppState;

/// Maximum concurrent requests for feed endpoints.
/// Feed requests serialize per spender anyway; this caps overall load.
const FEED_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Feeding
/// - `POST /v1/videos/:video_id/feed` - Feed one fish to a video
/// - `POST /v1/fish/claim` - Claim the daily fish reward
/// - `GET /v1/users/:user_id/fish` - Get a user's fish balance
///
/// ## Videos
/// - `GET /v1/videos/:video_id` - Cached detail view (counts the playback)
///
/// ## Notifications
/// - `GET /v1/notifications` - List a recipient's notifications
/// - `POST /v1/notifications/:notification_id/read` - Mark one as read
/// - `POST /v1/notifications/read-all` - Mark all as read
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Feed endpoints contend on per-spender locks; a concurrency limit keeps
    // a burst of lock-waiters from exhausting the server.
    let feed_routes = Router::new()
        .route("/videos/:video_id/feed", post(feed::feed_video))
        .route("/fish/claim", post(feed::claim_daily))
        .layer(ConcurrencyLimitLayer::new(FEED_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Balances and videos
        .route("/users/:user_id/fish", get(feed::get_balance))
        .route("/videos/:video_id", get(videos::get_video_detail))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/:notification_id/read",
            post(notifications::mark_read),
        )
        .route("/notifications/read-all", post(notifications::mark_all_read))
        // Feed routes (with their own concurrency limit)
        .merge(feed_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
