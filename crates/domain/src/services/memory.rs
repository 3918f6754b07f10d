//! In-process implementations of the domain ports.
//!
//! Every store keeps its state behind a single async mutex, so each port
//! call is atomic with respect to the others. That makes
//! `compare_and_set_status` a real CAS and lets tests exercise the
//! concurrent accept path without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::ports::{
    InvitationRepository, NotificationFeed, NotificationSink, ResourceStore, UserDirectory,
};
use crate::error::StoreError;
use crate::models::{
    Invitation, InvitationStatus, NewInvitation, NewNotification, Notification, Resource,
    ResourceFields, Subject, UserProfile,
};

/// In-memory invitation repository.
#[derive(Debug, Default)]
pub struct InMemoryInvitationRepository {
    rows: Mutex<Vec<Invitation>>,
}

impl InMemoryInvitationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored invitation, in insertion order.
    pub async fn all(&self) -> Vec<Invitation> {
        self.rows.lock().await.clone()
    }
}

fn newest_first(mut rows: Vec<Invitation>) -> Vec<Invitation> {
    // Rows arrive in insertion order; reversing first keeps ties newest-first.
    rows.reverse();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

#[async_trait]
impl InvitationRepository for InMemoryInvitationRepository {
    async fn find_pending(
        &self,
        sender_id: Uuid,
        recipient_email: &str,
        subject: Subject,
    ) -> Result<Option<Invitation>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .find(|i| {
                i.sender_id == sender_id
                    && i.recipient_email == recipient_email
                    && i.subject == subject
                    && i.status == InvitationStatus::Pending
            })
            .cloned())
    }

    async fn insert(&self, invitation: NewInvitation) -> Result<Invitation, StoreError> {
        let mut rows = self.rows.lock().await;
        let duplicate = rows.iter().any(|i| {
            i.sender_id == invitation.sender_id
                && i.recipient_email == invitation.recipient_email
                && i.subject == invitation.subject
                && i.status == InvitationStatus::Pending
        });
        if duplicate {
            return Err(StoreError::Duplicate(
                "pending invitation for sender, recipient and subject".to_string(),
            ));
        }

        // Keep creation times strictly increasing so ordering never falls back to ids.
        let now = match rows.last() {
            Some(last) if last.created_at >= Utc::now() => {
                last.created_at + chrono::Duration::microseconds(1)
            }
            _ => Utc::now(),
        };
        let stored = Invitation {
            id: Uuid::new_v4(),
            sender_id: invitation.sender_id,
            sender_email: invitation.sender_email,
            sender_name: invitation.sender_name,
            recipient_email: invitation.recipient_email,
            subject: invitation.subject,
            status: InvitationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|i| i.id == id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: InvitationStatus,
        new: InvitationStatus,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().await;
        match rows.iter_mut().find(|i| i.id == id && i.status == expected) {
            Some(row) => {
                row.status = new;
                row.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_pending_for_recipient(
        &self,
        email: &str,
    ) -> Result<Vec<Invitation>, StoreError> {
        let rows = self.rows.lock().await;
        let matching = rows
            .iter()
            .filter(|i| i.recipient_email == email && i.status == InvitationStatus::Pending)
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn list_for_sender(&self, sender_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
        let rows = self.rows.lock().await;
        let matching = rows
            .iter()
            .filter(|i| i.sender_id == sender_id)
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn list_accepted_for_subject(
        &self,
        subject: Subject,
    ) -> Result<Vec<Invitation>, StoreError> {
        let rows = self.rows.lock().await;
        let mut matching: Vec<Invitation> = rows
            .iter()
            .filter(|i| i.subject == subject && i.status == InvitationStatus::Accepted)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }
}

/// In-memory event and task store.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    resources: Mutex<HashMap<Uuid, Resource>>,
    fail_creates: AtomicBool,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing resource.
    pub async fn insert(&self, resource: Resource) {
        self.resources.lock().await.insert(resource.id, resource);
    }

    /// Deletes a resource regardless of owner, as plain CRUD would.
    pub async fn remove(&self, subject: Subject) -> Option<Resource> {
        let mut resources = self.resources.lock().await;
        match resources.get(&subject.id()) {
            Some(r) if r.subject() == subject => resources.remove(&subject.id()),
            _ => None,
        }
    }

    /// Every resource owned by `owner_id`.
    pub async fn owned_by(&self, owner_id: Uuid) -> Vec<Resource> {
        self.resources
            .lock()
            .await
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Makes subsequent `create_resource` calls fail with a backend error.
    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get_owned_resource(
        &self,
        subject: Subject,
        owner_id: Uuid,
    ) -> Result<Option<Resource>, StoreError> {
        let resources = self.resources.lock().await;
        Ok(resources
            .get(&subject.id())
            .filter(|r| r.subject() == subject && r.owner_id == owner_id)
            .cloned())
    }

    async fn resource_owner(&self, subject: Subject) -> Result<Option<Uuid>, StoreError> {
        let resources = self.resources.lock().await;
        Ok(resources
            .get(&subject.id())
            .filter(|r| r.subject() == subject)
            .map(|r| r.owner_id))
    }

    async fn create_resource(
        &self,
        owner_id: Uuid,
        fields: ResourceFields,
    ) -> Result<Resource, StoreError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("resource store unavailable".to_string()));
        }
        let resource = Resource {
            id: Uuid::new_v4(),
            owner_id,
            fields,
        };
        self.resources
            .lock()
            .await
            .insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn delete_resource(&self, subject: Subject, owner_id: Uuid) -> Result<bool, StoreError> {
        let mut resources = self.resources.lock().await;
        let owned = resources
            .get(&subject.id())
            .map(|r| r.subject() == subject && r.owner_id == owner_id)
            .unwrap_or(false);
        if owned {
            resources.remove(&subject.id());
        }
        Ok(owned)
    }
}

/// In-memory notification sink and feed.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    rows: Mutex<Vec<Notification>>,
    fail_appends: AtomicBool,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `append` calls fail with a backend error.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationStore {
    async fn append(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("notification sink unavailable".to_string()));
        }
        let stored = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            message: notification.message,
            notification_type: notification.notification_type,
            is_read: false,
            created_at: Utc::now(),
        };
        self.rows.lock().await.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl NotificationFeed for InMemoryNotificationStore {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows = self.rows.lock().await;
        let mut matching: Vec<Notification> = rows
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(matching)
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().await;
        match rows
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(row) => {
                row.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().await;
        let mut updated = 0;
        for row in rows.iter_mut().filter(|n| n.user_id == user_id && !n.is_read) {
            row.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

/// In-memory user directory.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<Uuid, UserProfile>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, user: UserProfile) {
        self.users.lock().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn find_by_emails(&self, emails: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .filter_map(|u| {
                let email = u.email.to_lowercase();
                emails.contains(&email).then(|| UserProfile {
                    email,
                    ..u.clone()
                })
            })
            .collect())
    }
}
