//! Storage and collaborator ports consumed by the invitation core.
//!
//! The persistence crate implements these against PostgreSQL; `memory`
//! implements them in-process for tests and local wiring.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Invitation, InvitationStatus, NewInvitation, NewNotification, Notification, Resource,
    ResourceFields, Subject, UserProfile,
};

/// Persistence for invitations. Holds no business rules.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// The pending invitation for `(sender, recipient, subject)`, if any.
    async fn find_pending(
        &self,
        sender_id: Uuid,
        recipient_email: &str,
        subject: Subject,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Stores a new pending invitation, assigning id and timestamps.
    ///
    /// Fails with `StoreError::Duplicate` when a pending invitation already
    /// exists for the same triple.
    async fn insert(&self, invitation: NewInvitation) -> Result<Invitation, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, StoreError>;

    /// Sets `status = new` only if it currently equals `expected`.
    ///
    /// Returns whether the write happened. This is the only concurrency
    /// primitive the accept path relies on.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: InvitationStatus,
        new: InvitationStatus,
    ) -> Result<bool, StoreError>;

    /// Pending invitations addressed to `email`, newest first.
    async fn list_pending_for_recipient(&self, email: &str)
        -> Result<Vec<Invitation>, StoreError>;

    /// Every invitation sent by `sender_id`, newest first.
    async fn list_for_sender(&self, sender_id: Uuid) -> Result<Vec<Invitation>, StoreError>;

    /// Accepted invitations for `subject`, oldest first.
    async fn list_accepted_for_subject(
        &self,
        subject: Subject,
    ) -> Result<Vec<Invitation>, StoreError>;
}

/// Owner of event and task records.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// The resource identified by `subject` if it is owned by `owner_id`.
    async fn get_owned_resource(
        &self,
        subject: Subject,
        owner_id: Uuid,
    ) -> Result<Option<Resource>, StoreError>;

    /// Owner of the resource identified by `subject`, if it exists.
    async fn resource_owner(&self, subject: Subject) -> Result<Option<Uuid>, StoreError>;

    async fn create_resource(
        &self,
        owner_id: Uuid,
        fields: ResourceFields,
    ) -> Result<Resource, StoreError>;

    /// Removes a resource. Only used to undo a copy made during accept.
    async fn delete_resource(&self, subject: Subject, owner_id: Uuid) -> Result<bool, StoreError>;
}

/// Append-only sink for user-visible notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn append(&self, notification: NewNotification) -> Result<Notification, StoreError>;
}

/// Read side of the notification sink, polled by clients.
#[async_trait]
pub trait NotificationFeed: NotificationSink {
    /// Newest first, at most `limit` entries.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, StoreError>;

    /// Returns false when the notification is absent or owned by someone else.
    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool, StoreError>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

/// Lookup of account details.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    /// Accounts whose (normalised) email is in `emails`. Unknown emails are
    /// simply absent from the result.
    async fn find_by_emails(&self, emails: &[String]) -> Result<Vec<UserProfile>, StoreError>;
}
