//! Invitation repository for database operations.

use async_trait::async_trait;
use domain::models::{Invitation, InvitationStatus, NewInvitation, Subject};
use domain::services::ports;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{InvitationEntity, InvitationStatusDb};
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for invitation-related database operations.
#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Creates a new InvitationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_invitations(rows: Vec<InvitationEntity>) -> Result<Vec<Invitation>, StoreError> {
    rows.into_iter().map(Invitation::try_from).collect()
}

#[async_trait]
impl ports::InvitationRepository for InvitationRepository {
    async fn find_pending(
        &self,
        sender_id: Uuid,
        recipient_email: &str,
        subject: Subject,
    ) -> Result<Option<Invitation>, StoreError> {
        let timer = QueryTimer::new("find_pending_invitation");
        let result = sqlx::query_as::<_, InvitationEntity>(
            r#"
            SELECT id, sender_id, sender_email, sender_name, recipient_email,
                   event_id, task_id, status, created_at, updated_at
            FROM invitations
            WHERE sender_id = $1 AND recipient_email = $2
              AND event_id IS NOT DISTINCT FROM $3
              AND task_id IS NOT DISTINCT FROM $4
              AND status = 'pending'
            "#,
        )
        .bind(sender_id)
        .bind(recipient_email)
        .bind(subject.event_id())
        .bind(subject.task_id())
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(store_error)?
            .map(Invitation::try_from)
            .transpose()
    }

    async fn insert(&self, invitation: NewInvitation) -> Result<Invitation, StoreError> {
        let timer = QueryTimer::new("insert_invitation");
        let result = sqlx::query_as::<_, InvitationEntity>(
            r#"
            INSERT INTO invitations (sender_id, sender_email, sender_name, recipient_email, event_id, task_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sender_id, sender_email, sender_name, recipient_email,
                      event_id, task_id, status, created_at, updated_at
            "#,
        )
        .bind(invitation.sender_id)
        .bind(&invitation.sender_email)
        .bind(&invitation.sender_name)
        .bind(&invitation.recipient_email)
        .bind(invitation.subject.event_id())
        .bind(invitation.subject.task_id())
        .fetch_one(&self.pool)
        .await;
        timer.record();

        Invitation::try_from(result.map_err(store_error)?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        let timer = QueryTimer::new("find_invitation_by_id");
        let result = sqlx::query_as::<_, InvitationEntity>(
            r#"
            SELECT id, sender_id, sender_email, sender_name, recipient_email,
                   event_id, task_id, status, created_at, updated_at
            FROM invitations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(store_error)?
            .map(Invitation::try_from)
            .transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: InvitationStatus,
        new: InvitationStatus,
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("compare_and_set_invitation_status");
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(InvitationStatusDb::from(expected))
        .bind(InvitationStatusDb::from(new))
        .execute(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.rows_affected() == 1)
    }

    async fn list_pending_for_recipient(
        &self,
        email: &str,
    ) -> Result<Vec<Invitation>, StoreError> {
        let timer = QueryTimer::new("list_pending_invitations_for_recipient");
        let result = sqlx::query_as::<_, InvitationEntity>(
            r#"
            SELECT id, sender_id, sender_email, sender_name, recipient_email,
                   event_id, task_id, status, created_at, updated_at
            FROM invitations
            WHERE recipient_email = $1 AND status = 'pending'
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        into_invitations(result.map_err(store_error)?)
    }

    async fn list_for_sender(&self, sender_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
        let timer = QueryTimer::new("list_invitations_for_sender");
        let result = sqlx::query_as::<_, InvitationEntity>(
            r#"
            SELECT id, sender_id, sender_email, sender_name, recipient_email,
                   event_id, task_id, status, created_at, updated_at
            FROM invitations
            WHERE sender_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(sender_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        into_invitations(result.map_err(store_error)?)
    }

    async fn list_accepted_for_subject(
        &self,
        subject: Subject,
    ) -> Result<Vec<Invitation>, StoreError> {
        let timer = QueryTimer::new("list_accepted_invitations_for_subject");
        let result = sqlx::query_as::<_, InvitationEntity>(
            r#"
            SELECT id, sender_id, sender_email, sender_name, recipient_email,
                   event_id, task_id, status, created_at, updated_at
            FROM invitations
            WHERE event_id IS NOT DISTINCT FROM $1
              AND task_id IS NOT DISTINCT FROM $2
              AND status = 'accepted'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(subject.event_id())
        .bind(subject.task_id())
        .fetch_all(&self.pool)
        .await;
        timer.record();

        into_invitations(result.map_err(store_error)?)
    }
}
