//! Event and task storage behind the resource port.

use async_trait::async_trait;
use domain::models::{Resource, ResourceFields, Subject};
use domain::services::ports;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EventEntity, TaskEntity, TaskPriorityDb, TaskStatusDb};
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for events and tasks.
#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    /// Creates a new ResourceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, owner_id, title, description, start_date, end_date, all_day,
                   location, color, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_task_by_id");
        let result = sqlx::query_as::<_, TaskEntity>(
            r#"
            SELECT id, owner_id, title, description, status, priority, due_date,
                   category, color, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    async fn find(&self, subject: Subject) -> Result<Option<Resource>, StoreError> {
        let resource = match subject {
            Subject::Event(id) => self.find_event(id).await.map_err(store_error)?.map(Resource::from),
            Subject::Task(id) => self.find_task(id).await.map_err(store_error)?.map(Resource::from),
        };
        Ok(resource)
    }
}

#[async_trait]
impl ports::ResourceStore for ResourceRepository {
    async fn get_owned_resource(
        &self,
        subject: Subject,
        owner_id: Uuid,
    ) -> Result<Option<Resource>, StoreError> {
        Ok(self.find(subject).await?.filter(|r| r.owner_id == owner_id))
    }

    async fn resource_owner(&self, subject: Subject) -> Result<Option<Uuid>, StoreError> {
        Ok(self.find(subject).await?.map(|r| r.owner_id))
    }

    async fn create_resource(
        &self,
        owner_id: Uuid,
        fields: ResourceFields,
    ) -> Result<Resource, StoreError> {
        match fields {
            ResourceFields::Event(event) => {
                let timer = QueryTimer::new("create_event");
                let result = sqlx::query_as::<_, EventEntity>(
                    r#"
                    INSERT INTO events (owner_id, title, description, start_date, end_date,
                                        all_day, location, color)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING id, owner_id, title, description, start_date, end_date, all_day,
                              location, color, created_at, updated_at
                    "#,
                )
                .bind(owner_id)
                .bind(&event.title)
                .bind(&event.description)
                .bind(event.start_date)
                .bind(event.end_date)
                .bind(event.all_day)
                .bind(&event.location)
                .bind(&event.color)
                .fetch_one(&self.pool)
                .await;
                timer.record();
                Ok(result.map_err(store_error)?.into())
            }
            ResourceFields::Task(task) => {
                let timer = QueryTimer::new("create_task");
                let result = sqlx::query_as::<_, TaskEntity>(
                    r#"
                    INSERT INTO tasks (owner_id, title, description, status, priority,
                                       due_date, category, color)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING id, owner_id, title, description, status, priority, due_date,
                              category, color, created_at, updated_at
                    "#,
                )
                .bind(owner_id)
                .bind(&task.title)
                .bind(&task.description)
                .bind(TaskStatusDb::from(task.status))
                .bind(TaskPriorityDb::from(task.priority))
                .bind(task.due_date)
                .bind(&task.category)
                .bind(&task.color)
                .fetch_one(&self.pool)
                .await;
                timer.record();
                Ok(result.map_err(store_error)?.into())
            }
        }
    }

    async fn delete_resource(&self, subject: Subject, owner_id: Uuid) -> Result<bool, StoreError> {
        let (query_name, sql) = match subject {
            Subject::Event(_) => (
                "delete_event",
                "DELETE FROM events WHERE id = $1 AND owner_id = $2",
            ),
            Subject::Task(_) => (
                "delete_task",
                "DELETE FROM tasks WHERE id = $1 AND owner_id = $2",
            ),
        };

        let timer = QueryTimer::new(query_name);
        let result = sqlx::query(sql)
            .bind(subject.id())
            .bind(owner_id)
            .execute(&self.pool)
            .await;
        timer.record();

        Ok(result.map_err(store_error)?.rows_affected() == 1)
    }
}
