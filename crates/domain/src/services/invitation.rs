//! Invitation lifecycle: send, list, accept and reject.
//!
//! Accepting forks the shared event or task into the recipient's workspace.
//! The status flip is a compare-and-set on the repository; every write that
//! follows it is undone if a later step fails, so an invitation is never
//! left `accepted` without a copy.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use shared::validation::{normalize_email, validate_email_address};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::ports::{InvitationRepository, NotificationSink, ResourceStore, UserDirectory};
use crate::error::DomainError;
use crate::models::{
    Decision, Identity, Invitation, InvitationStatus, NewInvitation, NewNotification, Resource,
    Subject,
};

/// Message for an invitation that is missing, not addressed to the caller,
/// or already answered.
const NOT_ACTIONABLE: &str = "Invitation not found or already processed";

/// Message for an accept whose subject was deleted after the invitation was sent.
const NO_LONGER_VALID: &str = "This invitation is no longer valid";

/// Result of a successful accept or reject.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub invitation: Invitation,
    /// The recipient's copy, present only on accept.
    pub resource: Option<Resource>,
}

/// Service coordinating invitations, resources and notifications.
#[derive(Clone)]
pub struct InvitationService {
    invitations: Arc<dyn InvitationRepository>,
    resources: Arc<dyn ResourceStore>,
    notifications: Arc<dyn NotificationSink>,
    users: Arc<dyn UserDirectory>,
}

impl InvitationService {
    pub fn new(
        invitations: Arc<dyn InvitationRepository>,
        resources: Arc<dyn ResourceStore>,
        notifications: Arc<dyn NotificationSink>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            invitations,
            resources,
            notifications,
            users,
        }
    }

    /// Invites `recipient_email` to a resource owned by `sender_id`.
    ///
    /// The sender gets a notification in their own feed recording the send.
    pub async fn send_invitation(
        &self,
        sender_id: Uuid,
        recipient_email: &str,
        subject: Subject,
    ) -> Result<Invitation, DomainError> {
        validate_email_address(recipient_email)?;
        let recipient_email = normalize_email(recipient_email);

        let sender = self
            .users
            .find_by_id(sender_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;

        if self
            .resources
            .get_owned_resource(subject, sender_id)
            .await?
            .is_none()
        {
            return Err(DomainError::NotFound(format!(
                "The {} was not found",
                subject.kind()
            )));
        }

        if self
            .invitations
            .find_pending(sender_id, &recipient_email, subject)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(format!(
                "An invitation to this {} is already pending for {}",
                subject.kind(),
                recipient_email
            )));
        }

        let invitation = self
            .invitations
            .insert(NewInvitation {
                sender_id,
                sender_email: sender.email.clone(),
                sender_name: sender.name.clone(),
                recipient_email: recipient_email.clone(),
                subject,
            })
            .await?;

        if let Err(err) = self
            .notifications
            .append(NewNotification::invitation_sent(
                sender_id,
                &recipient_email,
                subject.kind(),
            ))
            .await
        {
            self.withdraw_unrecorded(invitation.id).await?;
            return Err(DomainError::Transient(format!(
                "Failed to record invitation: {}",
                err
            )));
        }

        info!(
            invitation_id = %invitation.id,
            sender_id = %sender_id,
            subject_kind = %subject.kind(),
            subject_id = %subject.id(),
            "Invitation sent"
        );

        Ok(invitation)
    }

    /// Pending invitations addressed to `recipient_email`, newest first.
    pub async fn list_incoming(&self, recipient_email: &str) -> Result<Vec<Invitation>, DomainError> {
        let email = normalize_email(recipient_email);
        Ok(self.invitations.list_pending_for_recipient(&email).await?)
    }

    /// Every invitation sent by `sender_id`, newest first.
    pub async fn list_outgoing(&self, sender_id: Uuid) -> Result<Vec<Invitation>, DomainError> {
        Ok(self.invitations.list_for_sender(sender_id).await?)
    }

    /// Accepts or rejects a pending invitation addressed to `actor`.
    ///
    /// Of several concurrent calls for the same invitation exactly one wins
    /// the status flip; the others fail with `Conflict`. Once the invitation
    /// is terminal every further call fails with `NotFound`.
    pub async fn transition(
        &self,
        invitation_id: Uuid,
        actor: &Identity,
        decision: Decision,
    ) -> Result<TransitionOutcome, DomainError> {
        let email = normalize_email(&actor.email);
        let mut invitation = self
            .invitations
            .find_by_id(invitation_id)
            .await?
            .filter(|i| i.is_actionable_by(&email))
            .ok_or_else(|| DomainError::NotFound(NOT_ACTIONABLE.to_string()))?;

        let target = decision.target_status();
        debug_assert!(InvitationStatus::Pending.can_transition_to(target));
        let flipped = self
            .invitations
            .compare_and_set_status(invitation_id, InvitationStatus::Pending, target)
            .await?;
        if !flipped {
            return Err(DomainError::Conflict(
                "Invitation was processed by another request".to_string(),
            ));
        }
        invitation.status = target;
        invitation.updated_at = Utc::now();

        match decision {
            Decision::Reject => {
                info!(invitation_id = %invitation_id, user_id = %actor.user_id, "Invitation rejected");
                Ok(TransitionOutcome {
                    invitation,
                    resource: None,
                })
            }
            Decision::Accept => match self.fork_for_recipient(&invitation, actor.user_id).await {
                Ok(copy) => {
                    info!(
                        invitation_id = %invitation_id,
                        user_id = %actor.user_id,
                        resource_id = %copy.id,
                        "Invitation accepted"
                    );
                    Ok(TransitionOutcome {
                        invitation,
                        resource: Some(copy),
                    })
                }
                Err(err) => {
                    self.revert_acceptance(invitation_id).await?;
                    Err(err)
                }
            },
        }
    }

    /// Copies the invitation's subject to the recipient and confirms in
    /// their feed. Leaves nothing behind on failure.
    async fn fork_for_recipient(
        &self,
        invitation: &Invitation,
        recipient_id: Uuid,
    ) -> Result<Resource, DomainError> {
        let original = self
            .resources
            .get_owned_resource(invitation.subject, invitation.sender_id)
            .await
            .map_err(|e| DomainError::Transient(format!("Failed to load resource: {}", e)))?
            .ok_or_else(|| DomainError::NotFound(NO_LONGER_VALID.to_string()))?;

        let copy = self
            .resources
            .create_resource(recipient_id, original.fields.forked())
            .await
            .map_err(|e| DomainError::Transient(format!("Failed to copy resource: {}", e)))?;

        let confirmation = NewNotification::invitation_accepted(
            recipient_id,
            invitation.subject.kind(),
            original.fields.title(),
        );
        if let Err(err) = self.notifications.append(confirmation).await {
            match self.resources.delete_resource(copy.subject(), recipient_id).await {
                Ok(_) => {
                    warn!(invitation_id = %invitation.id, resource_id = %copy.id, "Removed copy after failed notification");
                }
                Err(delete_err) => {
                    error!(
                        invitation_id = %invitation.id,
                        resource_id = %copy.id,
                        error = %delete_err,
                        "Failed to remove copy after failed notification"
                    );
                    return Err(DomainError::Internal(format!(
                        "Failed to remove copied resource: {}",
                        delete_err
                    )));
                }
            }
            return Err(DomainError::Transient(format!(
                "Failed to record acceptance: {}",
                err
            )));
        }

        Ok(copy)
    }

    /// Closes a freshly sent invitation whose sender notification could not
    /// be written. It stays in the outgoing history as `rejected` and no
    /// longer blocks a resend.
    async fn withdraw_unrecorded(&self, invitation_id: Uuid) -> Result<(), DomainError> {
        self.compensate(
            "send",
            invitation_id,
            InvitationStatus::Pending,
            InvitationStatus::Rejected,
        )
        .await
    }

    /// Puts an accepted invitation back to `pending`.
    async fn revert_acceptance(&self, invitation_id: Uuid) -> Result<(), DomainError> {
        self.compensate(
            "accept",
            invitation_id,
            InvitationStatus::Accepted,
            InvitationStatus::Pending,
        )
        .await
    }

    async fn compensate(
        &self,
        operation: &'static str,
        invitation_id: Uuid,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<(), DomainError> {
        match self
            .invitations
            .compare_and_set_status(invitation_id, from, to)
            .await
        {
            Ok(true) => {
                counter!("invitation_compensations_total", "operation" => operation).increment(1);
                warn!(invitation_id = %invitation_id, operation, status = %to, "Compensated invitation");
                Ok(())
            }
            Ok(false) => {
                counter!("invitation_compensation_failures_total", "operation" => operation)
                    .increment(1);
                error!(invitation_id = %invitation_id, operation, "Invitation changed before compensation");
                Err(DomainError::Internal(format!(
                    "Invitation changed while compensating {}",
                    operation
                )))
            }
            Err(err) => {
                counter!("invitation_compensation_failures_total", "operation" => operation)
                    .increment(1);
                error!(invitation_id = %invitation_id, operation, error = %err, "Failed to compensate invitation");
                Err(DomainError::Internal(format!(
                    "Failed to compensate {}: {}",
                    operation, err
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EventFields, NotificationType, ResourceFields, TaskFields, TaskPriority, TaskStatus,
        UserProfile,
    };
    use crate::services::memory::{
        InMemoryInvitationRepository, InMemoryNotificationStore, InMemoryResourceStore,
        InMemoryUserDirectory,
    };
    use crate::error::StoreError;
    use crate::services::ports::NotificationFeed;
    use async_trait::async_trait;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    /// Recorder capturing metrics emitted on the current thread.
    fn thread_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    /// Repository whose `accepted → pending` write always fails.
    struct NoRevertRepository(Arc<InMemoryInvitationRepository>);

    #[async_trait]
    impl InvitationRepository for NoRevertRepository {
        async fn find_pending(
            &self,
            sender_id: Uuid,
            recipient_email: &str,
            subject: Subject,
        ) -> Result<Option<Invitation>, StoreError> {
            self.0.find_pending(sender_id, recipient_email, subject).await
        }

        async fn insert(&self, invitation: NewInvitation) -> Result<Invitation, StoreError> {
            self.0.insert(invitation).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
            self.0.find_by_id(id).await
        }

        async fn compare_and_set_status(
            &self,
            id: Uuid,
            expected: InvitationStatus,
            new: InvitationStatus,
        ) -> Result<bool, StoreError> {
            if expected == InvitationStatus::Accepted {
                return Err(StoreError::Backend("connection lost".to_string()));
            }
            self.0.compare_and_set_status(id, expected, new).await
        }

        async fn list_pending_for_recipient(
            &self,
            email: &str,
        ) -> Result<Vec<Invitation>, StoreError> {
            self.0.list_pending_for_recipient(email).await
        }

        async fn list_for_sender(&self, sender_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
            self.0.list_for_sender(sender_id).await
        }

        async fn list_accepted_for_subject(
            &self,
            subject: Subject,
        ) -> Result<Vec<Invitation>, StoreError> {
            self.0.list_accepted_for_subject(subject).await
        }
    }

    struct Fixture {
        service: InvitationService,
        invitations: Arc<InMemoryInvitationRepository>,
        resources: Arc<InMemoryResourceStore>,
        notifications: Arc<InMemoryNotificationStore>,
        users: Arc<InMemoryUserDirectory>,
        alice: UserProfile,
        bob: Identity,
    }

    async fn fixture() -> Fixture {
        let invitations = Arc::new(InMemoryInvitationRepository::new());
        let resources = Arc::new(InMemoryResourceStore::new());
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let users = Arc::new(InMemoryUserDirectory::new());

        let alice = UserProfile {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            name: Some("Alice".to_string()),
        };
        let bob = UserProfile {
            id: Uuid::new_v4(),
            email: "b@x.com".to_string(),
            name: None,
        };
        users.add(alice.clone()).await;
        users.add(bob.clone()).await;

        let service = InvitationService::new(
            invitations.clone(),
            resources.clone(),
            notifications.clone(),
            users.clone(),
        );

        Fixture {
            service,
            invitations,
            resources,
            notifications,
            users,
            alice,
            bob: Identity {
                user_id: bob.id,
                email: bob.email,
            },
        }
    }

    async fn seed_task(f: &Fixture, status: TaskStatus) -> Subject {
        let task = f
            .resources
            .create_resource(
                f.alice.id,
                ResourceFields::Task(TaskFields {
                    title: "Write report".to_string(),
                    description: Some("Q3".to_string()),
                    status,
                    priority: TaskPriority::High,
                    due_date: None,
                    category: Some("work".to_string()),
                    color: None,
                }),
            )
            .await
            .unwrap();
        task.subject()
    }

    async fn seed_event(f: &Fixture) -> Subject {
        let event = f
            .resources
            .create_resource(
                f.alice.id,
                ResourceFields::Event(EventFields {
                    title: "Standup".to_string(),
                    description: None,
                    start_date: Utc::now(),
                    end_date: Utc::now(),
                    all_day: false,
                    location: Some("Room 4".to_string()),
                    color: None,
                }),
            )
            .await
            .unwrap();
        event.subject()
    }

    // ==========================================================================
    // Send
    // ==========================================================================

    #[tokio::test]
    async fn test_send_creates_pending_invitation_and_sender_notification() {
        let f = fixture().await;
        let subject = seed_task(&f, TaskStatus::Todo).await;

        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert_eq!(invitation.sender_email, "a@x.com");
        assert_eq!(invitation.sender_name.as_deref(), Some("Alice"));
        assert_eq!(invitation.subject, subject);

        let feed = f.notifications.list_for_user(f.alice.id, 50).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].notification_type, NotificationType::Invitation);
        assert_eq!(feed[0].message, "Invitation sent to b@x.com for the task");
    }

    #[tokio::test]
    async fn test_send_normalizes_recipient_email() {
        let f = fixture().await;
        let subject = seed_event(&f).await;

        let invitation = f
            .service
            .send_invitation(f.alice.id, "  B@X.com ", subject)
            .await
            .unwrap();

        assert_eq!(invitation.recipient_email, "b@x.com");
    }

    #[tokio::test]
    async fn test_send_to_generated_addresses() {
        use fake::{faker::internet::en::SafeEmail, Fake};
        use std::collections::HashSet;

        let f = fixture().await;
        let subject = seed_event(&f).await;
        let mut seen = HashSet::new();

        for _ in 0..10 {
            let email: String = SafeEmail().fake();
            if !seen.insert(email.to_lowercase()) {
                continue;
            }
            let invitation = f
                .service
                .send_invitation(f.alice.id, &email, subject)
                .await
                .unwrap();
            assert_eq!(invitation.recipient_email, email.to_lowercase());
        }

        assert_eq!(f.invitations.all().await.len(), seen.len());
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_email() {
        let f = fixture().await;
        let subject = seed_event(&f).await;

        let result = f
            .service
            .send_invitation(f.alice.id, "not-an-email", subject)
            .await;

        assert!(matches!(result, Err(DomainError::Invalid(_))));
        assert!(f.invitations.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_unknown_sender_is_not_found() {
        let f = fixture().await;
        let subject = seed_event(&f).await;

        let result = f
            .service
            .send_invitation(Uuid::new_v4(), "b@x.com", subject)
            .await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_send_requires_ownership() {
        let f = fixture().await;
        let subject = seed_event(&f).await;

        let result = f
            .service
            .send_invitation(f.bob.user_id, "c@x.com", subject)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));

        let missing = f
            .service
            .send_invitation(f.alice.id, "b@x.com", Subject::Task(Uuid::new_v4()))
            .await;
        assert!(matches!(missing, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_second_pending_send_conflicts() {
        let f = fixture().await;
        let subject = seed_event(&f).await;

        f.service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();
        let second = f
            .service
            .send_invitation(f.alice.id, "B@x.com", subject)
            .await;

        assert!(matches!(second, Err(DomainError::Conflict(_))));
        assert_eq!(f.invitations.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_resend_allowed_after_rejection() {
        let f = fixture().await;
        let subject = seed_event(&f).await;

        let first = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();
        f.service
            .transition(first.id, &f.bob, Decision::Reject)
            .await
            .unwrap();

        let second = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    // ==========================================================================
    // Listing
    // ==========================================================================

    #[tokio::test]
    async fn test_list_incoming_only_pending_for_recipient() {
        let f = fixture().await;
        let event = seed_event(&f).await;
        let task = seed_task(&f, TaskStatus::Todo).await;

        let to_event = f
            .service
            .send_invitation(f.alice.id, "b@x.com", event)
            .await
            .unwrap();
        let to_task = f
            .service
            .send_invitation(f.alice.id, "b@x.com", task)
            .await
            .unwrap();
        f.service
            .send_invitation(f.alice.id, "c@x.com", task)
            .await
            .unwrap();

        f.service
            .transition(to_event.id, &f.bob, Decision::Reject)
            .await
            .unwrap();

        let incoming = f.service.list_incoming("B@X.COM").await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].id, to_task.id);
    }

    #[tokio::test]
    async fn test_list_outgoing_includes_every_status_newest_first() {
        let f = fixture().await;
        let event = seed_event(&f).await;
        let task = seed_task(&f, TaskStatus::Todo).await;

        let first = f
            .service
            .send_invitation(f.alice.id, "b@x.com", event)
            .await
            .unwrap();
        let second = f
            .service
            .send_invitation(f.alice.id, "b@x.com", task)
            .await
            .unwrap();
        f.service
            .transition(first.id, &f.bob, Decision::Reject)
            .await
            .unwrap();

        let outgoing = f.service.list_outgoing(f.alice.id).await.unwrap();
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].id, second.id);
        assert_eq!(outgoing[1].status, InvitationStatus::Rejected);

        assert!(f.service.list_outgoing(f.bob.user_id).await.unwrap().is_empty());
    }

    // ==========================================================================
    // Accept
    // ==========================================================================

    #[tokio::test]
    async fn test_accept_forks_task_with_fresh_status() {
        let f = fixture().await;
        let subject = seed_task(&f, TaskStatus::Done).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        let outcome = f
            .service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await
            .unwrap();

        assert_eq!(outcome.invitation.status, InvitationStatus::Accepted);
        let copy = outcome.resource.unwrap();
        assert_eq!(copy.owner_id, f.bob.user_id);
        assert_ne!(copy.id, subject.id());
        match &copy.fields {
            ResourceFields::Task(task) => {
                assert_eq!(task.status, TaskStatus::Todo);
                assert_eq!(task.title, "Write report");
                assert_eq!(task.priority, TaskPriority::High);
            }
            other => panic!("Expected task, got {:?}", other),
        }

        let feed = f.notifications.list_for_user(f.bob.user_id, 50).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].notification_type, NotificationType::TaskInvitation);
        assert_eq!(
            feed[0].message,
            "You accepted the invitation for the task: Write report"
        );

        let stored = f.invitations.find_by_id(invitation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_accept_retry_is_not_found_and_creates_no_second_copy() {
        let f = fixture().await;
        let subject = seed_task(&f, TaskStatus::InProgress).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        f.service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await
            .unwrap();
        let retry = f
            .service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await;

        assert!(matches!(retry, Err(DomainError::NotFound(_))));
        assert_eq!(f.resources.owned_by(f.bob.user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_by_other_user_is_not_found() {
        let f = fixture().await;
        let subject = seed_event(&f).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        let intruder = Identity {
            user_id: Uuid::new_v4(),
            email: "c@x.com".to_string(),
        };
        let result = f
            .service
            .transition(invitation.id, &intruder, Decision::Accept)
            .await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
        let stored = f.invitations.find_by_id(invitation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Pending);
    }

    #[tokio::test]
    async fn test_accept_matches_email_case_insensitively() {
        let f = fixture().await;
        let subject = seed_event(&f).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        let actor = Identity {
            user_id: f.bob.user_id,
            email: "B@X.com".to_string(),
        };
        let outcome = f
            .service
            .transition(invitation.id, &actor, Decision::Accept)
            .await
            .unwrap();
        assert!(outcome.resource.is_some());
    }

    #[tokio::test]
    async fn test_accept_after_subject_deleted_keeps_invitation_pending() {
        let f = fixture().await;
        let subject = seed_task(&f, TaskStatus::Todo).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        f.resources.remove(subject).await.unwrap();
        let result = f
            .service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await;

        assert_eq!(
            result,
            Err(DomainError::NotFound(NO_LONGER_VALID.to_string()))
        );
        let stored = f.invitations.find_by_id(invitation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Pending);
        assert!(f.resources.owned_by(f.bob.user_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_copy_failure_reverts_and_can_be_retried() {
        let f = fixture().await;
        let subject = seed_event(&f).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        f.resources.set_fail_creates(true);
        let result = f
            .service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await;
        assert!(matches!(result, Err(DomainError::Transient(_))));

        let stored = f.invitations.find_by_id(invitation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Pending);

        f.resources.set_fail_creates(false);
        let outcome = f
            .service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await
            .unwrap();
        assert_eq!(outcome.invitation.status, InvitationStatus::Accepted);
        assert_eq!(f.resources.owned_by(f.bob.user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_notification_failure_removes_copy_and_reverts() {
        let f = fixture().await;
        let subject = seed_task(&f, TaskStatus::Todo).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        f.notifications.set_fail_appends(true);
        let result = f
            .service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await;

        assert!(matches!(result, Err(DomainError::Transient(_))));
        assert!(f.resources.owned_by(f.bob.user_id).await.is_empty());
        let stored = f.invitations.find_by_id(invitation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Pending);
    }

    #[tokio::test]
    async fn test_send_notification_failure_withdraws_and_allows_resend() {
        let f = fixture().await;
        let subject = seed_event(&f).await;
        let (recorder, handle) = thread_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        f.notifications.set_fail_appends(true);
        let first = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await;
        assert!(matches!(first, Err(DomainError::Transient(_))));

        let stored = f.invitations.all().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, InvitationStatus::Rejected);
        assert!(handle
            .render()
            .contains("invitation_compensations_total{operation=\"send\"} 1"));

        f.notifications.set_fail_appends(false);
        let retry = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();
        assert_eq!(retry.status, InvitationStatus::Pending);

        let feed = f.notifications.list_for_user(f.alice.id, 50).await.unwrap();
        assert_eq!(feed.len(), 1);
        let outgoing = f.service.list_outgoing(f.alice.id).await.unwrap();
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].id, retry.id);
    }

    #[tokio::test]
    async fn test_deleted_subject_accept_counts_compensation() {
        let f = fixture().await;
        let subject = seed_event(&f).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();
        let (recorder, handle) = thread_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        f.resources.remove(subject).await.unwrap();
        let result = f
            .service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await;

        assert_eq!(
            result,
            Err(DomainError::NotFound(NO_LONGER_VALID.to_string()))
        );
        assert!(handle
            .render()
            .contains("invitation_compensations_total{operation=\"accept\"} 1"));
    }

    #[tokio::test]
    async fn test_failed_revert_is_internal_and_counted() {
        let f = fixture().await;
        let subject = seed_event(&f).await;
        let service = InvitationService::new(
            Arc::new(NoRevertRepository(f.invitations.clone())),
            f.resources.clone(),
            f.notifications.clone(),
            f.users.clone(),
        );
        let invitation = service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();
        let (recorder, handle) = thread_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        f.resources.set_fail_creates(true);
        let result = service
            .transition(invitation.id, &f.bob, Decision::Accept)
            .await;

        assert!(matches!(result, Err(DomainError::Internal(_))));
        let rendered = handle.render();
        assert!(rendered.contains("invitation_compensation_failures_total{operation=\"accept\"} 1"));
        assert!(!rendered.contains("invitation_compensations_total"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accepts_create_exactly_one_copy() {
        let f = fixture().await;
        let subject = seed_task(&f, TaskStatus::Todo).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = f.service.clone();
            let actor = f.bob.clone();
            let id = invitation.id;
            handles.push(tokio::spawn(async move {
                service.transition(id, &actor, Decision::Accept).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(DomainError::Conflict(_)) | Err(DomainError::NotFound(_)) => {}
                Err(other) => panic!("Unexpected error: {:?}", other),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(f.resources.owned_by(f.bob.user_id).await.len(), 1);
        let feed = f.notifications.list_for_user(f.bob.user_id, 50).await.unwrap();
        assert_eq!(feed.len(), 1);
    }

    // ==========================================================================
    // Reject
    // ==========================================================================

    #[tokio::test]
    async fn test_reject_then_reject_again_is_not_found() {
        let f = fixture().await;
        let subject = seed_event(&f).await;
        let invitation = f
            .service
            .send_invitation(f.alice.id, "b@x.com", subject)
            .await
            .unwrap();

        let outcome = f
            .service
            .transition(invitation.id, &f.bob, Decision::Reject)
            .await
            .unwrap();
        assert_eq!(outcome.invitation.status, InvitationStatus::Rejected);
        assert!(outcome.resource.is_none());

        let again = f
            .service
            .transition(invitation.id, &f.bob, Decision::Reject)
            .await;
        assert_eq!(again, Err(DomainError::NotFound(NOT_ACTIONABLE.to_string())));
        assert!(f.resources.owned_by(f.bob.user_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_transition_unknown_invitation_is_not_found() {
        let f = fixture().await;
        let result = f
            .service
            .transition(Uuid::new_v4(), &f.bob, Decision::Accept)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
