//! Notification feed handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::notification::{ListNotificationsResponse, MarkAllReadResponse};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// The caller's most recent notifications, newest first.
///
/// GET /api/v1/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    user: UserAuth,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let data = state
        .notifications
        .list_for_user(user.user_id, state.config.notifications.list_limit)
        .await?;
    let unread_count = data.iter().filter(|n| !n.is_read).count();

    Ok(Json(ListNotificationsResponse { data, unread_count }))
}

/// POST /api/v1/notifications/:notification_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: UserAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state
        .notifications
        .mark_read(user.user_id, notification_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Notification not found".to_string()))
    }
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: UserAuth,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = state.notifications.mark_all_read(user.user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
