//! User directory backed by the users table.

use async_trait::async_trait;
use domain::models::UserProfile;
use domain::services::ports;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for user lookups.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ports::UserDirectory for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.map(UserProfile::from))
    }

    async fn find_by_emails(&self, emails: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        let timer = QueryTimer::new("find_users_by_emails");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, name, created_at, updated_at
            FROM users
            WHERE LOWER(email) = ANY($1)
            "#,
        )
        .bind(emails)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(|entity| {
                let mut profile = UserProfile::from(entity);
                profile.email = profile.email.to_lowercase();
                profile
            })
            .collect())
    }
}
