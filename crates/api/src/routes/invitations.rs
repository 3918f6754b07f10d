//! Invitation endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::invitation::{
    InvitationResponse, ListInvitationsResponse, SendInvitationRequest, TransitionResponse,
};
use domain::models::{Decision, InvitationStatus};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{record_invitation_sent, record_invitation_transition};

/// Invite someone to one of the caller's events or tasks.
///
/// POST /api/v1/invitations
pub async fn send_invitation(
    State(state): State<AppState>,
    user: UserAuth,
    Json(request): Json<SendInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), ApiError> {
    request.validate()?;
    let subject = request.subject()?;

    let invitation = state
        .invitations
        .send_invitation(user.user_id, &request.recipient_email, subject)
        .await?;

    record_invitation_sent(subject.kind());

    Ok((StatusCode::CREATED, Json(invitation.into())))
}

/// Pending invitations addressed to the caller's email.
///
/// GET /api/v1/invitations
pub async fn list_incoming(
    State(state): State<AppState>,
    user: UserAuth,
) -> Result<Json<ListInvitationsResponse>, ApiError> {
    let invitations = state.invitations.list_incoming(&user.email).await?;

    Ok(Json(ListInvitationsResponse {
        data: invitations.into_iter().map(Into::into).collect(),
    }))
}

/// Every invitation the caller has sent.
///
/// GET /api/v1/invitations/sent
pub async fn list_outgoing(
    State(state): State<AppState>,
    user: UserAuth,
) -> Result<Json<ListInvitationsResponse>, ApiError> {
    let invitations = state.invitations.list_outgoing(user.user_id).await?;

    Ok(Json(ListInvitationsResponse {
        data: invitations.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/v1/invitations/:invitation_id/accept
pub async fn accept_invitation(
    State(state): State<AppState>,
    user: UserAuth,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    transition(&state, &user, invitation_id, Decision::Accept).await
}

/// POST /api/v1/invitations/:invitation_id/reject
pub async fn reject_invitation(
    State(state): State<AppState>,
    user: UserAuth,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    transition(&state, &user, invitation_id, Decision::Reject).await
}

async fn transition(
    state: &AppState,
    user: &UserAuth,
    invitation_id: Uuid,
    decision: Decision,
) -> Result<Json<TransitionResponse>, ApiError> {
    let outcome = match state
        .invitations
        .transition(invitation_id, &user.identity(), decision)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            info!(
                invitation_id = %invitation_id,
                user_id = %user.user_id,
                decision = %decision,
                error = %err,
                "Invitation transition refused"
            );
            return Err(err.into());
        }
    };

    record_invitation_transition(decision);

    let message = match outcome.invitation.status {
        InvitationStatus::Accepted => format!(
            "Invitation accepted. The {} was added to your workspace",
            outcome.invitation.subject.kind()
        ),
        _ => "Invitation rejected".to_string(),
    };

    Ok(Json(TransitionResponse {
        id: outcome.invitation.id,
        status: outcome.invitation.status,
        resource_id: outcome.resource.map(|r| r.id),
        message,
    }))
}
