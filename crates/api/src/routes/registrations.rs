//! Registration routes: self-registration, organizer listing and override,
//! payload reprint and the public verification lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::registration::{
    CreateRegistrationRequest, CreateRegistrationResponse, ListRegistrationsResponse,
    PublicVerificationInfo, RegistrationListItem, RegistrationPayloadResponse,
    SetVerificationRequest, SetVerificationResponse,
};
use domain::models::{Event, Registration};
use domain::services::payload_codec;
use persistence::repositories::{
    CreateRegistrationResult, EventRepository, NewRegistration, RegistrationRepository,
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{is_unique_violation, ApiError};
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_registration;

/// Register for an event by slug.
///
/// POST /api/v1/public/events/:slug/register
///
/// The canonical scan payload is encoded before the insert so the stored
/// code always names the row it belongs to.
pub async fn register_for_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<CreateRegistrationResponse>), ApiError> {
    request.validate()?;

    let event: Event = EventRepository::new(state.pool.clone())
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?
        .into();

    if !event.accepts_registrations() {
        record_registration("closed");
        return Err(ApiError::Validation(
            "Registration is closed for this event".to_string(),
        ));
    }

    let registration_id = Uuid::new_v4();
    let event_id = event.id.to_string();
    let qr_code = payload_codec::encode(&event_id, &registration_id.to_string());
    let email = request.normalized_email();
    let name = request.name.trim();
    let phone = request
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let result = RegistrationRepository::new(state.pool.clone())
        .create_with_capacity(NewRegistration {
            id: registration_id,
            event_id: event.id,
            name,
            email: &email,
            phone,
            location: request.location.trim(),
            qr_code: &qr_code,
        })
        .await;

    let registration: Registration = match result {
        Ok(CreateRegistrationResult::Created(entity)) => entity.into(),
        Ok(CreateRegistrationResult::CapacityReached) => {
            record_registration("full");
            return Err(ApiError::Conflict("This event is full".to_string()));
        }
        Ok(CreateRegistrationResult::EventUnavailable) => {
            record_registration("closed");
            return Err(ApiError::Validation(
                "Registration is closed for this event".to_string(),
            ));
        }
        Err(e) if is_unique_violation(&e) => {
            record_registration("duplicate");
            return Err(ApiError::Conflict(
                "This email is already registered for this event".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    record_registration("created");
    info!(
        event_id = %event.id,
        registration_id = %registration.id,
        "Registration created"
    );

    let verify_url = payload_codec::verification_url(
        &state.config.check_in.verify_base_url,
        &event_id,
        &registration.id.to_string(),
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateRegistrationResponse {
            id: registration.id,
            event_id: registration.event_id,
            name: registration.name,
            email: registration.email,
            qr_code: registration.qr_code,
            verify_url,
            created_at: registration.created_at,
        }),
    ))
}

/// List an event's registrations, newest first.
///
/// GET /api/v1/events/:event_id/registrations
///
/// Requires JWT authentication.
pub async fn list_registrations(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ListRegistrationsResponse>, ApiError> {
    EventRepository::new(state.pool.clone())
        .find_owned(event_id, user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let data: Vec<RegistrationListItem> = RegistrationRepository::new(state.pool.clone())
        .list_for_event(event_id)
        .await?
        .into_iter()
        .map(|entity| Registration::from(entity).into())
        .collect();

    let verified_count = data.iter().filter(|r| r.verified).count();

    Ok(Json(ListRegistrationsResponse {
        total: data.len(),
        verified_count,
        data,
    }))
}

/// Set or clear a registration's verification flag.
///
/// POST /api/v1/registrations/:registration_id/verification
///
/// Requires JWT authentication. This is the only way to un-verify.
pub async fn set_verification(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(registration_id): Path<Uuid>,
    Json(request): Json<SetVerificationRequest>,
) -> Result<Json<SetVerificationResponse>, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let not_found = || ApiError::NotFound("Registration not found or unauthorized".to_string());

    repo.find_for_organizer(registration_id, user_auth.user_id)
        .await?
        .ok_or_else(not_found)?;

    let registration: Registration = repo
        .set_verified(registration_id, request.verified)
        .await?
        .ok_or_else(not_found)?
        .into();

    info!(
        registration_id = %registration.id,
        verified = registration.verified,
        user_id = %user_auth.user_id,
        "Verification overridden"
    );

    let message = if registration.verified {
        "Registration verified successfully"
    } else {
        "Registration unverified successfully"
    };

    Ok(Json(SetVerificationResponse {
        registration: registration.summary(),
        message: message.to_string(),
    }))
}

/// Canonical payload for reprinting a registration's code.
///
/// GET /api/v1/events/:event_id/registrations/:registration_id/payload
///
/// Requires JWT authentication.
pub async fn get_registration_payload(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((event_id, registration_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RegistrationPayloadResponse>, ApiError> {
    EventRepository::new(state.pool.clone())
        .find_owned(event_id, user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let registration = RegistrationRepository::new(state.pool.clone())
        .find_in_event(registration_id, event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

    let event_id = registration.event_id.to_string();
    let registration_id = registration.id.to_string();

    Ok(Json(RegistrationPayloadResponse {
        registration_id: registration.id,
        event_id: registration.event_id,
        payload: payload_codec::encode(&event_id, &registration_id),
        verify_url: payload_codec::verification_url(
            &state.config.check_in.verify_base_url,
            &event_id,
            &registration_id,
        ),
    }))
}

/// Read-only registration status behind a verification link.
///
/// GET /api/v1/public/verify/:event_id/:registration_id
pub async fn get_verification_info(
    State(state): State<AppState>,
    Path((event_id, registration_id)): Path<(Uuid, String)>,
) -> Result<Json<PublicVerificationInfo>, ApiError> {
    let not_found = || ApiError::NotFound("Registration not found".to_string());

    let Ok(registration_id) = Uuid::parse_str(&registration_id) else {
        warn!(event_id = %event_id, "Verification link with malformed registration ID");
        return Err(not_found());
    };

    let event: Event = EventRepository::new(state.pool.clone())
        .find_by_id(event_id)
        .await?
        .ok_or_else(not_found)?
        .into();

    let registration: Registration = RegistrationRepository::new(state.pool.clone())
        .find_in_event(registration_id, event_id)
        .await?
        .ok_or_else(not_found)?
        .into();

    Ok(Json(PublicVerificationInfo {
        registration: registration.summary(),
        event: event.public_info(),
    }))
}
