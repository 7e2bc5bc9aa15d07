//! Registration domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::event::PublicEventInfo;

/// An attendee's registration for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: String,
    /// Canonical scan payload rendered into the attendee's code.
    pub qr_code: String,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn summary(&self) -> RegistrationSummary {
        RegistrationSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            verified: self.verified,
        }
    }
}

/// Public fields of a registration returned by check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub verified: bool,
}

/// Self-registration request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateRegistrationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    #[serde(default)]
    pub location: String,
}

impl CreateRegistrationRequest {
    /// Emails are unique per event case-insensitively.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Response after a successful self-registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateRegistrationResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub qr_code: String,
    pub verify_url: String,
    pub created_at: DateTime<Utc>,
}

/// Registration row as listed for the organizer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationListItem {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: String,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub qr_code: String,
}

impl From<Registration> for RegistrationListItem {
    fn from(r: Registration) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            phone: r.phone,
            location: r.location,
            verified: r.verified,
            verified_at: r.verified_at,
            created_at: r.created_at,
            qr_code: r.qr_code,
        }
    }
}

/// Response for listing an event's registrations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRegistrationsResponse {
    pub data: Vec<RegistrationListItem>,
    pub total: usize,
    pub verified_count: usize,
}

/// Organizer override of the verification flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SetVerificationRequest {
    pub verified: bool,
}

/// Response after an organizer override.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SetVerificationResponse {
    pub registration: RegistrationSummary,
    pub message: String,
}

/// Read-only view served by the public verification link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicVerificationInfo {
    pub registration: RegistrationSummary,
    pub event: PublicEventInfo,
}

/// Canonical payload for re-rendering a registration's code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationPayloadResponse {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub payload: String,
    pub verify_url: String,
}
