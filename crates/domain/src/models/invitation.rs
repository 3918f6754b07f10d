//! Invitation domain models.
//!
//! An invitation shares one event or one task with a recipient addressed by
//! email. It moves from `pending` to exactly one terminal state and is never
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// Kind of resource an invitation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Event,
    Task,
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectKind::Event => write!(f, "event"),
            SubjectKind::Task => write!(f, "task"),
        }
    }
}

/// The event or task an invitation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Subject {
    Event(Uuid),
    Task(Uuid),
}

impl Subject {
    pub fn new(kind: SubjectKind, id: Uuid) -> Self {
        match kind {
            SubjectKind::Event => Subject::Event(id),
            SubjectKind::Task => Subject::Task(id),
        }
    }

    /// Builds a subject from the two optional identifiers used on the wire
    /// and in storage. Exactly one must be present.
    pub fn from_parts(event_id: Option<Uuid>, task_id: Option<Uuid>) -> Result<Self, DomainError> {
        match (event_id, task_id) {
            (Some(id), None) => Ok(Subject::Event(id)),
            (None, Some(id)) => Ok(Subject::Task(id)),
            (Some(_), Some(_)) => Err(DomainError::Invalid(
                "An invitation refers to either an event or a task, not both".to_string(),
            )),
            (None, None) => Err(DomainError::Invalid(
                "An event_id or a task_id is required".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Event(_) => SubjectKind::Event,
            Subject::Task(_) => SubjectKind::Task,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Subject::Event(id) | Subject::Task(id) => *id,
        }
    }

    pub fn event_id(&self) -> Option<Uuid> {
        match self {
            Subject::Event(id) => Some(*id),
            Subject::Task(_) => None,
        }
    }

    pub fn task_id(&self) -> Option<Uuid> {
        match self {
            Subject::Task(id) => Some(*id),
            Subject::Event(_) => None,
        }
    }
}

/// Status of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    /// Only `pending → accepted` and `pending → rejected` are allowed.
    pub fn can_transition_to(&self, next: InvitationStatus) -> bool {
        matches!(
            (self, next),
            (InvitationStatus::Pending, InvitationStatus::Accepted)
                | (InvitationStatus::Pending, InvitationStatus::Rejected)
        )
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A recipient's answer to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> InvitationStatus {
        match self {
            Decision::Accept => InvitationStatus::Accepted,
            Decision::Reject => InvitationStatus::Rejected,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Accept => write!(f, "accept"),
            Decision::Reject => write!(f, "reject"),
        }
    }
}

/// A persisted invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_email: String,
    /// Captured at send time so history survives profile edits.
    pub sender_name: Option<String>,
    pub recipient_email: String,
    pub subject: Subject,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    /// Whether `email` (already normalised) may accept or reject this invitation.
    pub fn is_actionable_by(&self, email: &str) -> bool {
        self.status == InvitationStatus::Pending && self.recipient_email == email
    }
}

/// Invitation data before the repository assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvitation {
    pub sender_id: Uuid,
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub recipient_email: String,
    pub subject: Subject,
}

/// Request to send an invitation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SendInvitationRequest {
    #[serde(alias = "recipientEmail")]
    #[validate(length(max = 254, message = "Email address is too long"))]
    #[validate(email(message = "Invalid email address"))]
    pub recipient_email: String,

    #[serde(default, alias = "eventId")]
    pub event_id: Option<Uuid>,

    #[serde(default, alias = "taskId")]
    pub task_id: Option<Uuid>,
}

impl SendInvitationRequest {
    pub fn subject(&self) -> Result<Subject, DomainError> {
        Subject::from_parts(self.event_id, self.task_id)
    }
}

/// Invitation as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub recipient_email: String,
    pub subject_kind: SubjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Invitation> for InvitationResponse {
    fn from(invitation: Invitation) -> Self {
        Self {
            id: invitation.id,
            sender_id: invitation.sender_id,
            sender_email: invitation.sender_email,
            sender_name: invitation.sender_name,
            recipient_email: invitation.recipient_email,
            subject_kind: invitation.subject.kind(),
            event_id: invitation.subject.event_id(),
            task_id: invitation.subject.task_id(),
            status: invitation.status,
            created_at: invitation.created_at,
            updated_at: invitation.updated_at,
        }
    }
}

/// Response for listing invitations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListInvitationsResponse {
    pub data: Vec<InvitationResponse>,
}

/// Response after accepting or rejecting an invitation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TransitionResponse {
    pub id: Uuid,
    pub status: InvitationStatus,
    /// Id of the copy created for the recipient on accept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Uuid>,
    pub message: String,
}
