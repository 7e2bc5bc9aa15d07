//! Check-in routes: organizer scanner, public kiosk and verification links.
//!
//! Handlers hand the raw scan to [`CheckInService`] and only shape the
//! outcome into a [`CheckInResponse`]. Public responses never carry
//! diagnostics; organizer responses do when `check_in.debug_diagnostics` is on.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{CheckInResponse, CheckInStatus, PublicVerifyScanRequest, VerifyScanRequest};
use domain::services::{CheckInReport, CheckInService, Requester, VerificationOutcome};
use persistence::repositories::{EventRepository, RegistrationRepository};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{record_check_in_outcome, record_scan_format};

/// Message for every failed public check-in.
pub const PUBLIC_FAILURE_MESSAGE: &str = "Unable to verify this registration";

type CheckInResult = Result<(StatusCode, Json<CheckInResponse>), ApiError>;

/// Who sees the response, and how much of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Organizer { debug: bool },
    Public,
}

impl Audience {
    fn label(&self) -> &'static str {
        match self {
            Audience::Organizer { .. } => "organizer",
            Audience::Public => "public",
        }
    }
}

fn check_in_service(state: &AppState) -> CheckInService<EventRepository, RegistrationRepository> {
    CheckInService::new(
        EventRepository::new(state.pool.clone()),
        RegistrationRepository::new(state.pool.clone()),
        state.config.check_in.storage_timeout(),
    )
}

/// Check in a scanned code at an organizer-owned event.
///
/// POST /api/v1/events/:event_id/verify
///
/// Requires JWT authentication.
pub async fn verify_for_organizer(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Json(request): Json<VerifyScanRequest>,
) -> CheckInResult {
    request.validate()?;

    let requester = Requester::Organizer {
        user_id: user_auth.user_id,
    };
    let report = check_in_service(&state)
        .check_in_scan(&request.qr_data, event_id, requester)
        .await;

    let audience = Audience::Organizer {
        debug: state.config.check_in.debug_diagnostics,
    };
    Ok(respond(&report, event_id, audience))
}

/// Check in a scanned code from a public kiosk.
///
/// POST /api/v1/public/verify-registration
pub async fn verify_public(
    State(state): State<AppState>,
    Json(request): Json<PublicVerifyScanRequest>,
) -> CheckInResult {
    request.validate()?;

    let report = check_in_service(&state)
        .check_in_scan(&request.qr_data, request.event_id, Requester::Public)
        .await;

    Ok(respond(&report, request.event_id, Audience::Public))
}

/// Check in the registration named by a verification link.
///
/// POST /api/v1/public/verify/:event_id/:registration_id
///
/// The link is rebuilt into its path form and run through the same pipeline
/// as a scanned code.
pub async fn verify_link(
    State(state): State<AppState>,
    Path((event_id, registration_id)): Path<(Uuid, String)>,
) -> CheckInResult {
    let raw = format!("/verify/{}/{}", event_id, registration_id);

    let report = check_in_service(&state)
        .check_in_scan(&raw, event_id, Requester::Public)
        .await;

    Ok(respond(&report, event_id, Audience::Public))
}

/// Log, count and present an outcome.
fn respond(
    report: &CheckInReport,
    event_id: Uuid,
    audience: Audience,
) -> (StatusCode, Json<CheckInResponse>) {
    let outcome = &report.outcome;
    let path = audience.label();

    if let Some(payload) = &report.payload {
        record_scan_format(payload.format.as_str());
    }
    record_check_in_outcome(outcome.label(), path);

    match outcome {
        VerificationOutcome::VerifiedNow(r) => {
            info!(event_id = %event_id, registration_id = %r.id, path, "Registration checked in")
        }
        VerificationOutcome::AlreadyVerified(r) => info!(
            event_id = %event_id,
            registration_id = %r.id,
            path,
            "Registration already checked in"
        ),
        VerificationOutcome::InternalFailure { detail } => {
            error!(event_id = %event_id, path, detail = %detail, "Check-in failed")
        }
        other => warn!(
            event_id = %event_id,
            path,
            outcome = other.label(),
            diagnostic = %diagnostic(report).unwrap_or_default(),
            "Check-in rejected"
        ),
    }

    let (status, response) = present(report, audience);
    (status, Json(response))
}

/// Map an outcome to an HTTP status and response body.
pub fn present(report: &CheckInReport, audience: Audience) -> (StatusCode, CheckInResponse) {
    let outcome = &report.outcome;
    let (http_status, status) = match outcome {
        VerificationOutcome::VerifiedNow(_) => (StatusCode::OK, CheckInStatus::Verified),
        VerificationOutcome::AlreadyVerified(_) => (StatusCode::OK, CheckInStatus::AlreadyVerified),
        VerificationOutcome::InvalidPayload { .. } => {
            (StatusCode::BAD_REQUEST, CheckInStatus::InvalidPayload)
        }
        VerificationOutcome::EventNotFoundOrUnauthorized { .. } => {
            (StatusCode::NOT_FOUND, CheckInStatus::EventNotFound)
        }
        VerificationOutcome::RegistrationNotFound { .. } => {
            (StatusCode::NOT_FOUND, CheckInStatus::RegistrationNotFound)
        }
        VerificationOutcome::InternalFailure { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, CheckInStatus::InternalError)
        }
    };

    let message = match (outcome, audience) {
        (VerificationOutcome::VerifiedNow(r), _) => format!("{} verified successfully", r.name),
        (VerificationOutcome::AlreadyVerified(r), _) => {
            format!("{} is already checked in", r.name)
        }
        (_, Audience::Public) => PUBLIC_FAILURE_MESSAGE.to_string(),
        (VerificationOutcome::InvalidPayload { .. }, _) => "Invalid QR code format".to_string(),
        (VerificationOutcome::EventNotFoundOrUnauthorized { .. }, _) => {
            "Event not found or unauthorized".to_string()
        }
        (VerificationOutcome::RegistrationNotFound { .. }, _) => {
            "Registration not found for this event".to_string()
        }
        (VerificationOutcome::InternalFailure { .. }, _) => {
            "Failed to verify registration".to_string()
        }
    };

    let debug = match audience {
        Audience::Organizer { debug: true } => diagnostic(report),
        _ => None,
    };

    let response = CheckInResponse {
        status,
        message,
        registration: outcome.registration().cloned(),
        already_verified: matches!(outcome, VerificationOutcome::AlreadyVerified(_)),
        debug,
    };

    (http_status, response)
}

/// Diagnostic text for a failed outcome.
fn diagnostic(report: &CheckInReport) -> Option<String> {
    let format = report
        .payload
        .as_ref()
        .map(|p| p.format.as_str())
        .unwrap_or("none");

    match &report.outcome {
        VerificationOutcome::VerifiedNow(_) | VerificationOutcome::AlreadyVerified(_) => None,
        VerificationOutcome::InvalidPayload { raw, reason } => {
            Some(format!("{}; raw scan: {:?}", reason, raw))
        }
        VerificationOutcome::EventNotFoundOrUnauthorized { event_id } => {
            Some(format!("event {} not found or not owned by requester", event_id))
        }
        VerificationOutcome::RegistrationNotFound {
            registration_id,
            event_id,
        } => Some(format!(
            "no registration {:?} in event {:?} (decoded as {})",
            registration_id, event_id, format
        )),
        VerificationOutcome::InternalFailure { detail } => Some(detail.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::{Registration, RegistrationSummary};
    use domain::services::payload_codec::encode;
    use domain::services::{InMemoryCheckInStore, PayloadFormat, ScanPayload};
    use std::time::Duration;

    fn summary(verified: bool) -> RegistrationSummary {
        RegistrationSummary {
            id: Uuid::new_v4(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            verified,
        }
    }

    fn report(outcome: VerificationOutcome) -> CheckInReport {
        CheckInReport {
            outcome,
            payload: None,
        }
    }

    fn failures() -> Vec<CheckInReport> {
        vec![
            report(VerificationOutcome::InvalidPayload {
                raw: "garbage".to_string(),
                reason: "Unrecognized scan payload".to_string(),
            }),
            report(VerificationOutcome::EventNotFoundOrUnauthorized {
                event_id: Uuid::new_v4(),
            }),
            CheckInReport {
                outcome: VerificationOutcome::RegistrationNotFound {
                    registration_id: "reg456".to_string(),
                    event_id: "evt123".to_string(),
                },
                payload: Some(ScanPayload {
                    event_id: "evt123".to_string(),
                    registration_id: "reg456".to_string(),
                    format: PayloadFormat::DelimitedPair,
                }),
            },
            report(VerificationOutcome::InternalFailure {
                detail: "Storage error: connection reset by 10.0.0.5".to_string(),
            }),
        ]
    }

    #[test]
    fn test_verified_now() {
        let (status, body) = present(
            &report(VerificationOutcome::VerifiedNow(summary(true))),
            Audience::Public,
        );

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, CheckInStatus::Verified);
        assert_eq!(body.message, "Ada Lovelace verified successfully");
        assert!(!body.already_verified);
        assert!(body.registration.unwrap().verified);
    }

    #[test]
    fn test_already_verified() {
        let (status, body) = present(
            &report(VerificationOutcome::AlreadyVerified(summary(true))),
            Audience::Organizer { debug: true },
        );

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, CheckInStatus::AlreadyVerified);
        assert_eq!(body.message, "Ada Lovelace is already checked in");
        assert!(body.already_verified);
        assert!(body.debug.is_none());
    }

    #[test]
    fn test_failure_status_codes() {
        let expected = [
            StatusCode::BAD_REQUEST,
            StatusCode::NOT_FOUND,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ];
        for (report, status) in failures().iter().zip(expected) {
            assert_eq!(present(report, Audience::Public).0, status);
            assert_eq!(present(report, Audience::Organizer { debug: false }).0, status);
        }
    }

    #[test]
    fn test_public_failures_are_generic() {
        for report in failures() {
            let (_, body) = present(&report, Audience::Public);
            assert_eq!(body.message, PUBLIC_FAILURE_MESSAGE);
            assert!(body.debug.is_none());
            assert!(body.registration.is_none());

            let json = serde_json::to_string(&body).unwrap();
            assert!(!json.contains("10.0.0.5"));
            assert!(!json.contains("garbage"));
        }
    }

    #[test]
    fn test_organizer_debug_only_when_enabled() {
        for report in failures() {
            let (_, quiet) = present(&report, Audience::Organizer { debug: false });
            assert!(quiet.debug.is_none());
            assert_ne!(quiet.message, PUBLIC_FAILURE_MESSAGE);

            let (_, verbose) = present(&report, Audience::Organizer { debug: true });
            assert!(verbose.debug.is_some());
        }
    }

    #[test]
    fn test_debug_echoes_identifiers() {
        let reports = failures();

        let (_, body) = present(&reports[0], Audience::Organizer { debug: true });
        assert!(body.debug.unwrap().contains("\"garbage\""));

        let (_, body) = present(&reports[2], Audience::Organizer { debug: true });
        let debug = body.debug.unwrap();
        assert!(debug.contains("reg456"));
        assert!(debug.contains("evt123"));
        assert!(debug.contains("delimited_pair"));

        let (_, body) = present(&reports[3], Audience::Organizer { debug: true });
        assert!(body.debug.unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_pipeline_to_response() {
        let store = InMemoryCheckInStore::new();
        let organizer_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let registration_id = Uuid::new_v4();
        store.add_event(event_id, organizer_id);
        store.add_registration(Registration {
            id: registration_id,
            event_id,
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone: None,
            location: String::new(),
            qr_code: encode(&event_id.to_string(), &registration_id.to_string()),
            verified: false,
            verified_at: None,
            created_at: Utc::now(),
        });
        let service = CheckInService::new(store.clone(), store, Duration::from_secs(1));
        let link = format!("/verify/{}/{}", event_id, registration_id);

        let first = service.check_in_scan(&link, event_id, Requester::Public).await;
        let (status, body) = present(&first, Audience::Public);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, "Grace Hopper verified successfully");

        let second = service.check_in_scan(&link, event_id, Requester::Public).await;
        let (status, body) = present(&second, Audience::Public);
        assert_eq!(status, StatusCode::OK);
        assert!(body.already_verified);
    }
}
