//! Invitation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Invitation, InvitationStatus, Subject};
use domain::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for invitation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
pub enum InvitationStatusDb {
    Pending,
    Accepted,
    Rejected,
}

impl From<InvitationStatusDb> for InvitationStatus {
    fn from(db: InvitationStatusDb) -> Self {
        match db {
            InvitationStatusDb::Pending => InvitationStatus::Pending,
            InvitationStatusDb::Accepted => InvitationStatus::Accepted,
            InvitationStatusDb::Rejected => InvitationStatus::Rejected,
        }
    }
}

impl From<InvitationStatus> for InvitationStatusDb {
    fn from(status: InvitationStatus) -> Self {
        match status {
            InvitationStatus::Pending => InvitationStatusDb::Pending,
            InvitationStatus::Accepted => InvitationStatusDb::Accepted,
            InvitationStatus::Rejected => InvitationStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the invitations table.
#[derive(Debug, Clone, FromRow)]
pub struct InvitationEntity {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub recipient_email: String,
    pub event_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub status: InvitationStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<InvitationEntity> for Invitation {
    type Error = StoreError;

    fn try_from(entity: InvitationEntity) -> Result<Self, Self::Error> {
        let subject = Subject::from_parts(entity.event_id, entity.task_id).map_err(|e| {
            StoreError::Backend(format!("invitation {} has no valid subject: {}", entity.id, e))
        })?;

        Ok(Self {
            id: entity.id,
            sender_id: entity.sender_id,
            sender_email: entity.sender_email,
            sender_name: entity.sender_name,
            recipient_email: entity.recipient_email,
            subject,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(event_id: Option<Uuid>, task_id: Option<Uuid>) -> InvitationEntity {
        InvitationEntity {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            sender_email: "a@x.com".to_string(),
            sender_name: Some("Alice".to_string()),
            recipient_email: "b@x.com".to_string(),
            event_id,
            task_id,
            status: InvitationStatusDb::Accepted,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_invitation() {
        let task_id = Uuid::new_v4();
        let invitation = Invitation::try_from(entity(None, Some(task_id))).unwrap();
        assert_eq!(invitation.subject, Subject::Task(task_id));
        assert_eq!(invitation.status, InvitationStatus::Accepted);
        assert_eq!(invitation.sender_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_entity_without_subject_is_backend_error() {
        let result = Invitation::try_from(entity(None, None));
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            InvitationStatus::Pending,
            InvitationStatus::Accepted,
            InvitationStatus::Rejected,
        ] {
            let db: InvitationStatusDb = status.into();
            assert_eq!(InvitationStatus::from(db), status);
        }
    }
}
