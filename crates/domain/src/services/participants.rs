//! Participant view of an event or task.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::ports::{InvitationRepository, ResourceStore, UserDirectory};
use crate::error::DomainError;
use crate::models::{Participant, ParticipantRole, Subject, SubjectKind};

/// Derives who has access to a resource: its creator followed by every
/// recipient who accepted an invitation to it.
#[derive(Clone)]
pub struct ParticipantViewBuilder {
    invitations: Arc<dyn InvitationRepository>,
    resources: Arc<dyn ResourceStore>,
    users: Arc<dyn UserDirectory>,
}

impl ParticipantViewBuilder {
    pub fn new(
        invitations: Arc<dyn InvitationRepository>,
        resources: Arc<dyn ResourceStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            invitations,
            resources,
            users,
        }
    }

    /// Participants of the resource, creator first, then accepted
    /// recipients by invitation age.
    pub async fn build_participants(
        &self,
        owner_id: Uuid,
        resource_id: Uuid,
        kind: SubjectKind,
    ) -> Result<Vec<Participant>, DomainError> {
        let owner = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Resource owner not found".to_string()))?;

        let mut accepted = self
            .invitations
            .list_accepted_for_subject(Subject::new(kind, resource_id))
            .await?;
        accepted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut emails: Vec<String> = accepted.iter().map(|i| i.recipient_email.clone()).collect();
        emails.sort();
        emails.dedup();
        let profiles: HashMap<String, String> = if emails.is_empty() {
            HashMap::new()
        } else {
            self.users
                .find_by_emails(&emails)
                .await?
                .into_iter()
                .map(|u| (u.email.clone(), u.display_name().to_string()))
                .collect()
        };

        let mut participants = Vec::with_capacity(accepted.len() + 1);
        participants.push(Participant::creator(&owner));
        participants.extend(accepted.into_iter().map(|invitation| Participant {
            display_name: profiles
                .get(&invitation.recipient_email)
                .cloned()
                .unwrap_or_else(|| invitation.recipient_email.clone()),
            email: invitation.recipient_email,
            role: ParticipantRole::Accepted,
            invited_by_name: invitation.sender_name,
        }));

        Ok(participants)
    }

    /// Participant view for `actor_id`, who must own the resource.
    ///
    /// Fails with `NotFound` when the resource does not exist and with
    /// `Forbidden` when it belongs to someone else.
    pub async fn view_for(
        &self,
        actor_id: Uuid,
        subject: Subject,
    ) -> Result<Vec<Participant>, DomainError> {
        let owner_id = self
            .resources
            .resource_owner(subject)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("The {} was not found", subject.kind())))?;

        if owner_id != actor_id {
            return Err(DomainError::Forbidden(format!(
                "Only the creator can view participants of this {}",
                subject.kind()
            )));
        }

        self.build_participants(owner_id, subject.id(), subject.kind())
            .await
    }
}
