//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: String,
    pub qr_code: String,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<RegistrationEntity> for domain::models::Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            name: entity.name,
            email: entity.email,
            phone: entity.phone,
            location: entity.location,
            qr_code: entity.qr_code,
            verified: entity.verified,
            verified_at: entity.verified_at,
            created_at: entity.created_at,
        }
    }
}
