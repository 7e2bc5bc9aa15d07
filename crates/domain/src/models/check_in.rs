//! Check-in request and response models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::registration::RegistrationSummary;

/// Longest scan text accepted from a scanner or manual entry.
pub const MAX_SCAN_TEXT_LENGTH: u64 = 4096;

/// Organizer scan submitted from the dashboard scanner.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct VerifyScanRequest {
    #[validate(length(min = 1, max = 4096, message = "qr_data must be 1-4096 characters"))]
    pub qr_data: String,
}

/// Scan submitted from a public kiosk.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct PublicVerifyScanRequest {
    #[validate(length(min = 1, max = 4096, message = "qr_data must be 1-4096 characters"))]
    pub qr_data: String,
    pub event_id: Uuid,
}

/// Machine-readable status of a check-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    Verified,
    AlreadyVerified,
    InvalidPayload,
    EventNotFound,
    RegistrationNotFound,
    InternalError,
}

impl CheckInStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInStatus::Verified => "verified",
            CheckInStatus::AlreadyVerified => "already_verified",
            CheckInStatus::InvalidPayload => "invalid_payload",
            CheckInStatus::EventNotFound => "event_not_found",
            CheckInStatus::RegistrationNotFound => "registration_not_found",
            CheckInStatus::InternalError => "internal_error",
        }
    }
}

/// Response body for every check-in attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInResponse {
    pub status: CheckInStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationSummary>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub already_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}
