//! Event and task snapshots read by the invitation core.
//!
//! Plain event/task CRUD lives elsewhere; the core only needs enough of a
//! resource to copy it into the recipient's workspace on accept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invitation::{Subject, SubjectKind};

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "TODO"),
            TaskStatus::InProgress => write!(f, "IN_PROGRESS"),
            TaskStatus::Done => write!(f, "DONE"),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Descriptive fields of a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub all_day: bool,
    pub location: Option<String>,
    pub color: Option<String>,
}

/// Descriptive fields of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub color: Option<String>,
}

/// Fields of either resource kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceFields {
    Event(EventFields),
    Task(TaskFields),
}

impl ResourceFields {
    pub fn kind(&self) -> SubjectKind {
        match self {
            ResourceFields::Event(_) => SubjectKind::Event,
            ResourceFields::Task(_) => SubjectKind::Task,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ResourceFields::Event(event) => &event.title,
            ResourceFields::Task(task) => &task.title,
        }
    }

    /// Fields for the recipient's personal copy.
    ///
    /// Everything descriptive carries over; a task always starts again at
    /// `TODO` whatever state the sender's task is in.
    pub fn forked(&self) -> ResourceFields {
        match self {
            ResourceFields::Event(event) => ResourceFields::Event(event.clone()),
            ResourceFields::Task(task) => ResourceFields::Task(TaskFields {
                status: TaskStatus::Todo,
                ..task.clone()
            }),
        }
    }
}

/// An owned event or task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub fields: ResourceFields,
}

impl Resource {
    pub fn subject(&self) -> Subject {
        Subject::new(self.fields.kind(), self.id)
    }
}
