//! Participant list handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::participant::ListParticipantsResponse;
use domain::models::Subject;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/events/:event_id/participants
pub async fn event_participants(
    State(state): State<AppState>,
    user: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ListParticipantsResponse>, ApiError> {
    participants_for(&state, &user, Subject::Event(event_id)).await
}

/// GET /api/v1/tasks/:task_id/participants
pub async fn task_participants(
    State(state): State<AppState>,
    user: UserAuth,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ListParticipantsResponse>, ApiError> {
    participants_for(&state, &user, Subject::Task(task_id)).await
}

async fn participants_for(
    state: &AppState,
    user: &UserAuth,
    subject: Subject,
) -> Result<Json<ListParticipantsResponse>, ApiError> {
    let data = state.participants.view_for(user.user_id, subject).await?;
    Ok(Json(ListParticipantsResponse { data }))
}
