//! Notification listing and read-state handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use fishbowl_core::{Notification, NotificationId, NotificationKind, UserId};
use fishbowl_store::Store;

use crate::error::ApiError;
use crate::handlers::feed::ActingUser;
use crate::state::AppState;

/// Notification list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    /// The recipient whose notifications to list.
    pub user_id: UserId,
    /// Maximum number of notifications to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Notification response.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Notification ID.
    pub id: String,
    /// The user who triggered the notification.
    pub sender_id: String,
    /// Notification kind, in its wire form ("`NEW_FISH`" / "`NEW_COMMENT`").
    pub kind: NotificationKind,
    /// The entity the notification is about (video ID).
    pub related_entity_id: String,
    /// Rendered display text.
    pub content: String,
    /// Whether the recipient has read it.
    pub read: bool,
    /// Timestamp.
    pub created_at: String,
}

impl From<&Notification> for NotificationResponse {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.to_string(),
            sender_id: n.sender_id.to_string(),
            kind: n.kind,
            related_entity_id: n.related_entity_id.to_string(),
            content: n.content.clone(),
            read: n.read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// List notifications response.
#[derive(Debug, Serialize)]
pub struct ListNotificationsResponse {
    /// Notifications (newest first).
    pub notifications: Vec<NotificationResponse>,
    /// Whether there are more notifications.
    pub has_more: bool,
}

/// List a recipient's notifications, newest first.
///
/// `GET /v1/notifications?user_id=...&limit=...&offset=...`
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let notifications =
        state
            .store
            .list_notifications_by_recipient(&query.user_id, limit + 1, query.offset)?;

    let has_more = notifications.len() > limit;
    let notifications: Vec<_> = notifications
        .iter()
        .take(limit)
        .map(NotificationResponse::from)
        .collect();

    Ok(Json(ListNotificationsResponse {
        notifications,
        has_more,
    }))
}

/// Mark-read response.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    /// How many notifications were marked read.
    pub updated: u64,
}

/// Mark one notification as read.
///
/// `POST /v1/notifications/:notification_id/read`
///
/// Only the notification's recipient may mark it read.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<NotificationId>,
    Json(body): Json<ActingUser>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let notification = state
        .store
        .get_notification(&notification_id)?
        .ok_or_else(|| ApiError::NotFound(format!("notification not found: {notification_id}")))?;

    if notification.recipient_id != body.user_id {
        return Err(ApiError::NotFound(format!(
            "notification not found: {notification_id}"
        )));
    }

    state.store.mark_notification_read(&notification_id)?;
    Ok(Json(MarkReadResponse { updated: 1 }))
}

/// Mark all of a recipient's notifications as read.
///
/// `POST /v1/notifications/read-all`
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActingUser>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let updated = state.store.mark_all_read(&body.user_id)?;
    Ok(Json(MarkReadResponse { updated }))
}
