//! Event repository for database operations.

use async_trait::async_trait;
use domain::services::{EventStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::EventEntity;
use crate::metrics::QueryTimer;

const EVENT_COLUMNS: &str = "id, organizer_id, slug, title, description, event_date, event_time, \
     location, status, max_attendees, created_at, updated_at";

/// Repository for event lookups.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find event by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }

    /// Find event by its public slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_slug");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }

    /// Find event by ID, only if owned by `organizer_id`.
    pub async fn find_owned(
        &self,
        id: Uuid,
        organizer_id: Uuid,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_owned_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND organizer_id = $2"
        ))
        .bind(id)
        .bind(organizer_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }

    /// Check whether an event exists.
    pub async fn exists(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("event_exists");
        let result =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await;
        timer.record_result(&result);
        result
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn is_owned_by(&self, event_id: Uuid, organizer_id: Uuid) -> Result<bool, StoreError> {
        self.find_owned(event_id, organizer_id)
            .await
            .map(|event| event.is_some())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn exists(&self, event_id: Uuid) -> Result<bool, StoreError> {
        EventRepository::exists(self, event_id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
