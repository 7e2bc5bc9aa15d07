//! Registration repository for database operations.

use async_trait::async_trait;
use domain::models::Registration;
use domain::services::{RegistrationStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::RegistrationEntity;
use crate::metrics::QueryTimer;

const REGISTRATION_COLUMNS: &str =
    "id, event_id, name, email, phone, location, qr_code, verified, verified_at, created_at";

/// Input for a new registration. The ID is chosen by the caller so the scan
/// payload can be encoded before the insert.
#[derive(Debug, Clone)]
pub struct NewRegistration<'a> {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub location: &'a str,
    pub qr_code: &'a str,
}

/// Result of a capacity-checked insert.
#[derive(Debug)]
pub enum CreateRegistrationResult {
    Created(RegistrationEntity),
    /// The event is gone or no longer active.
    EventUnavailable,
    CapacityReached,
}

/// Repository for registration-related database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a registration unless the event is inactive or at capacity.
    ///
    /// The event row is locked for the duration of the transaction, and the
    /// count check and insert run as one statement. A duplicate email for the
    /// event surfaces as a unique violation.
    pub async fn create_with_capacity(
        &self,
        input: NewRegistration<'_>,
    ) -> Result<CreateRegistrationResult, sqlx::Error> {
        let timer = QueryTimer::new("create_registration");
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM events
            WHERE id = $1 AND status = 'active'
            FOR UPDATE
            "#,
        )
        .bind(input.event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            tx.rollback().await?;
            timer.record();
            return Ok(CreateRegistrationResult::EventUnavailable);
        }

        let created = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            INSERT INTO registrations (id, event_id, name, email, phone, location, qr_code)
            SELECT $1, e.id, $3, $4, $5, $6, $7
            FROM events e
            WHERE e.id = $2
              AND (e.max_attendees IS NULL
                   OR (SELECT COUNT(*) FROM registrations r WHERE r.event_id = e.id) < e.max_attendees)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(input.id)
        .bind(input.event_id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.phone)
        .bind(input.location)
        .bind(input.qr_code)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        Ok(match created {
            Some(entity) => CreateRegistrationResult::Created(entity),
            None => CreateRegistrationResult::CapacityReached,
        })
    }

    /// Find a registration by ID within an event.
    pub async fn find_in_event(
        &self,
        id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_in_event");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 AND event_id = $2"
        ))
        .bind(id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }

    /// Find a registration whose event is owned by `organizer_id`.
    pub async fn find_for_organizer(
        &self,
        id: Uuid,
        organizer_id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_for_organizer");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT r.id, r.event_id, r.name, r.email, r.phone, r.location, r.qr_code,
                   r.verified, r.verified_at, r.created_at
            FROM registrations r
            JOIN events e ON r.event_id = e.id
            WHERE r.id = $1 AND e.organizer_id = $2
            "#,
        )
        .bind(id)
        .bind(organizer_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }

    /// List an event's registrations, newest first.
    pub async fn list_for_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_registrations_for_event");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE event_id = $1 \
             ORDER BY created_at DESC, id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }

    /// Count registrations for an event.
    pub async fn count_for_event(&self, event_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_registrations_for_event");
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }

    /// Set `verified = true` only if the row is in `event_id` and unverified.
    ///
    /// Returns `None` when no row changed, so concurrent callers see exactly
    /// one `Some`.
    pub async fn mark_verified(
        &self,
        id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_registration_verified");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations
            SET verified = true, verified_at = NOW()
            WHERE id = $1 AND event_id = $2 AND verified = false
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }

    /// Unconditionally set the verification flag. Clearing it also clears
    /// `verified_at`.
    pub async fn set_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_registration_verified");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations
            SET verified = $2,
                verified_at = CASE
                    WHEN $2 AND verified THEN verified_at
                    WHEN $2 THEN NOW()
                    ELSE NULL
                END
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await;
        timer.record_result(&result);
        result
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn find_in_event(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        RegistrationRepository::find_in_event(self, registration_id, event_id)
            .await
            .map(|found| found.map(Registration::from))
            .map_err(backend)
    }

    async fn mark_verified(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        RegistrationRepository::mark_verified(self, registration_id, event_id)
            .await
            .map(|updated| updated.map(Registration::from))
            .map_err(backend)
    }
}
