//! Notification entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Notification, NotificationType};
use domain::StoreError;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    #[sqlx(rename = "type")]
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationEntity> for Notification {
    type Error = StoreError;

    fn try_from(entity: NotificationEntity) -> Result<Self, Self::Error> {
        let notification_type =
            NotificationType::from_str(&entity.notification_type).map_err(StoreError::Backend)?;

        Ok(Self {
            id: entity.id,
            user_id: entity.user_id,
            message: entity.message,
            notification_type,
            is_read: entity.is_read,
            created_at: entity.created_at,
        })
    }
}
