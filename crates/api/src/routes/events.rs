//! Public event routes.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{Event, PublicEventResponse};
use persistence::repositories::{EventRepository, RegistrationRepository};

use crate::app::AppState;
use crate::error::ApiError;

/// Public event page data.
///
/// GET /api/v1/public/events/:slug
pub async fn get_public_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicEventResponse>, ApiError> {
    let event: Event = EventRepository::new(state.pool.clone())
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?
        .into();

    let registration_count = RegistrationRepository::new(state.pool.clone())
        .count_for_event(event.id)
        .await?;

    Ok(Json(PublicEventResponse::new(&event, registration_count)))
}
