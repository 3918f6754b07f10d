//! Calendar event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{EventFields, Resource, ResourceFields};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub all_day: bool,
    pub location: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Resource {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            fields: ResourceFields::Event(EventFields {
                title: entity.title,
                description: entity.description,
                start_date: entity.start_date,
                end_date: entity.end_date,
                all_day: entity.all_day,
                location: entity.location,
                color: entity.color,
            }),
        }
    }
}
