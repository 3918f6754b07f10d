//! Notification repository for database operations.

use async_trait::async_trait;
use domain::models::{NewNotification, Notification};
use domain::services::ports;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::NotificationEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for the append-only notification feed.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ports::NotificationSink for NotificationRepository {
    async fn append(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let timer = QueryTimer::new("append_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (user_id, message, type)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, message, type, is_read, created_at
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.message)
        .bind(notification.notification_type.as_str())
        .fetch_one(&self.pool)
        .await;
        timer.record();

        Notification::try_from(result.map_err(store_error)?)
    }
}

#[async_trait]
impl ports::NotificationFeed for NotificationRepository {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let timer = QueryTimer::new("list_notifications_for_user");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT id, user_id, message, type, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map_err(store_error)?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("mark_notification_read");
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("mark_all_notifications_read");
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.rows_affected())
    }
}
