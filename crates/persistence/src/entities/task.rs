//! Task entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Resource, ResourceFields, TaskFields, TaskPriority, TaskStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatusDb {
    Todo,
    InProgress,
    Done,
}

impl From<TaskStatusDb> for TaskStatus {
    fn from(db: TaskStatusDb) -> Self {
        match db {
            TaskStatusDb::Todo => TaskStatus::Todo,
            TaskStatusDb::InProgress => TaskStatus::InProgress,
            TaskStatusDb::Done => TaskStatus::Done,
        }
    }
}

impl From<TaskStatus> for TaskStatusDb {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Todo => TaskStatusDb::Todo,
            TaskStatus::InProgress => TaskStatusDb::InProgress,
            TaskStatus::Done => TaskStatusDb::Done,
        }
    }
}

/// Database enum for task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriorityDb {
    Low,
    Medium,
    High,
}

impl From<TaskPriorityDb> for TaskPriority {
    fn from(db: TaskPriorityDb) -> Self {
        match db {
            TaskPriorityDb::Low => TaskPriority::Low,
            TaskPriorityDb::Medium => TaskPriority::Medium,
            TaskPriorityDb::High => TaskPriority::High,
        }
    }
}

impl From<TaskPriority> for TaskPriorityDb {
    fn from(priority: TaskPriority) -> Self {
        match priority {
            TaskPriority::Low => TaskPriorityDb::Low,
            TaskPriority::Medium => TaskPriorityDb::Medium,
            TaskPriority::High => TaskPriorityDb::High,
        }
    }
}

/// Database row mapping for the tasks table.
#[derive(Debug, Clone, FromRow)]
pub struct TaskEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatusDb,
    pub priority: TaskPriorityDb,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskEntity> for Resource {
    fn from(entity: TaskEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            fields: ResourceFields::Task(TaskFields {
                title: entity.title,
                description: entity.description,
                status: entity.status.into(),
                priority: entity.priority.into(),
                due_date: entity.due_date,
                category: entity.category,
                color: entity.color,
            }),
        }
    }
}
