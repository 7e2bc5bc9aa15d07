//! Event entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::EventStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for event_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Active,
    Ended,
    Cancelled,
}

impl From<EventStatusDb> for EventStatus {
    fn from(db_status: EventStatusDb) -> Self {
        match db_status {
            EventStatusDb::Active => EventStatus::Active,
            EventStatusDb::Ended => EventStatus::Ended,
            EventStatusDb::Cancelled => EventStatus::Cancelled,
        }
    }
}

impl From<EventStatus> for EventStatusDb {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Active => EventStatusDb::Active,
            EventStatus::Ended => EventStatusDb::Ended,
            EventStatus::Cancelled => EventStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<String>,
    pub location: String,
    pub status: EventStatusDb,
    pub max_attendees: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for domain::models::Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            organizer_id: entity.organizer_id,
            slug: entity.slug,
            title: entity.title,
            description: entity.description,
            event_date: entity.event_date,
            event_time: entity.event_time,
            location: entity.location,
            status: entity.status.into(),
            max_attendees: entity.max_attendees,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
