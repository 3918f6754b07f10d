//! User-visible notification models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invitation::SubjectKind;

/// Notification type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// Sender's own record of an invitation they sent.
    Invitation,
    EventInvitation,
    TaskInvitation,
}

impl NotificationType {
    /// Type of the confirmation a recipient gets after accepting.
    pub fn accepted(kind: SubjectKind) -> Self {
        match kind {
            SubjectKind::Event => NotificationType::EventInvitation,
            SubjectKind::Task => NotificationType::TaskInvitation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Invitation => "INVITATION",
            NotificationType::EventInvitation => "EVENT_INVITATION",
            NotificationType::TaskInvitation => "TASK_INVITATION",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVITATION" => Ok(NotificationType::Invitation),
            "EVENT_INVITATION" => Ok(NotificationType::EventInvitation),
            "TASK_INVITATION" => Ok(NotificationType::TaskInvitation),
            other => Err(format!("Unknown notification type: {}", other)),
        }
    }
}

/// A notification in a user's feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification data before the sink assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub message: String,
    pub notification_type: NotificationType,
}

impl NewNotification {
    pub fn invitation_sent(sender_id: Uuid, recipient_email: &str, kind: SubjectKind) -> Self {
        Self {
            user_id: sender_id,
            message: format!("Invitation sent to {} for the {}", recipient_email, kind),
            notification_type: NotificationType::Invitation,
        }
    }

    pub fn invitation_accepted(recipient_id: Uuid, kind: SubjectKind, title: &str) -> Self {
        Self {
            user_id: recipient_id,
            message: format!("You accepted the invitation for the {}: {}", kind, title),
            notification_type: NotificationType::accepted(kind),
        }
    }
}

/// Response for listing notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListNotificationsResponse {
    pub data: Vec<Notification>,
    pub unread_count: usize,
}

/// Response after marking every notification as read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MarkAllReadResponse {
    pub updated: u64,
}
