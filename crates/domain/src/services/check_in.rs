//! Check-in verification service.
//!
//! Resolves a scanned payload to a registration within an event and moves its
//! verification flag from false to true. The transition is delegated to
//! [`RegistrationStore::mark_verified`], which must be a single conditional
//! write: of any number of concurrent callers at most one gets a row back.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Registration, RegistrationSummary};
use crate::services::payload_codec::{self, ScanPayload};

/// Who is asking for the check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    /// Authenticated organizer; must own the event.
    Organizer { user_id: Uuid },
    /// Public kiosk or verification link; the event only has to exist.
    Public,
}

impl Requester {
    pub fn is_public(&self) -> bool {
        matches!(self, Requester::Public)
    }
}

/// Failure reported by a backing store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Backend(String),

    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),
}

/// Event lookups needed by check-in.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Returns true if the event exists and is owned by `organizer_id`.
    async fn is_owned_by(&self, event_id: Uuid, organizer_id: Uuid) -> Result<bool, StoreError>;

    /// Returns true if the event exists.
    async fn exists(&self, event_id: Uuid) -> Result<bool, StoreError>;
}

/// Registration lookups and the verification transition.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Finds a registration by ID, scoped to an event.
    async fn find_in_event(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Registration>, StoreError>;

    /// Sets `verified = true` where the registration is in `event_id` and not
    /// yet verified. Returns the updated registration, or `None` if nothing
    /// changed.
    async fn mark_verified(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Registration>, StoreError>;
}

/// Result of a check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// This call performed the transition.
    VerifiedNow(RegistrationSummary),
    /// The registration was already checked in; nothing was written.
    AlreadyVerified(RegistrationSummary),
    InvalidPayload {
        raw: String,
        reason: String,
    },
    EventNotFoundOrUnauthorized {
        event_id: Uuid,
    },
    RegistrationNotFound {
        registration_id: String,
        event_id: String,
    },
    InternalFailure {
        detail: String,
    },
}

impl VerificationOutcome {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::VerifiedNow(_) => "verified_now",
            VerificationOutcome::AlreadyVerified(_) => "already_verified",
            VerificationOutcome::InvalidPayload { .. } => "invalid_payload",
            VerificationOutcome::EventNotFoundOrUnauthorized { .. } => "event_not_found",
            VerificationOutcome::RegistrationNotFound { .. } => "registration_not_found",
            VerificationOutcome::InternalFailure { .. } => "internal_failure",
        }
    }

    /// True for both terminal success states.
    pub fn is_checked_in(&self) -> bool {
        matches!(
            self,
            VerificationOutcome::VerifiedNow(_) | VerificationOutcome::AlreadyVerified(_)
        )
    }

    pub fn registration(&self) -> Option<&RegistrationSummary> {
        match self {
            VerificationOutcome::VerifiedNow(r) | VerificationOutcome::AlreadyVerified(r) => Some(r),
            _ => None,
        }
    }

    fn internal(err: StoreError) -> Self {
        VerificationOutcome::InternalFailure {
            detail: err.to_string(),
        }
    }
}

/// Outcome of a check-in together with what the scan decoded to, if it got
/// that far.
#[derive(Debug, Clone)]
pub struct CheckInReport {
    pub outcome: VerificationOutcome,
    pub payload: Option<ScanPayload>,
}

/// Orchestrates decode, scoping and the verification transition.
#[derive(Debug, Clone)]
pub struct CheckInService<E, R> {
    events: E,
    registrations: R,
    storage_timeout: Duration,
}

impl<E, R> CheckInService<E, R>
where
    E: EventStore,
    R: RegistrationStore,
{
    pub fn new(events: E, registrations: R, storage_timeout: Duration) -> Self {
        Self {
            events,
            registrations,
            storage_timeout,
        }
    }

    /// Verifies a scanned payload in the context of `event_id`.
    ///
    /// Expected conditions (bad payload, missing event or registration,
    /// repeated scans) come back as outcome values. Store errors and timeouts
    /// become [`VerificationOutcome::InternalFailure`].
    pub async fn verify_and_check_in(
        &self,
        raw: &str,
        event_id: Uuid,
        requester: Requester,
    ) -> VerificationOutcome {
        self.check_in_scan(raw, event_id, requester).await.outcome
    }

    /// Like [`Self::verify_and_check_in`], also returning the decoded payload
    /// for diagnostics.
    pub async fn check_in_scan(
        &self,
        raw: &str,
        event_id: Uuid,
        requester: Requester,
    ) -> CheckInReport {
        // Access first: a non-owned event is reported as such whatever was scanned.
        let denied = match self.event_accessible(event_id, requester).await {
            Ok(true) => None,
            Ok(false) => Some(VerificationOutcome::EventNotFoundOrUnauthorized { event_id }),
            Err(err) => Some(VerificationOutcome::internal(err)),
        };
        if let Some(outcome) = denied {
            return CheckInReport {
                outcome,
                payload: None,
            };
        }

        let payload = match payload_codec::decode(raw) {
            Ok(payload) => payload,
            Err(err) => {
                return CheckInReport {
                    outcome: VerificationOutcome::InvalidPayload {
                        raw: raw.to_string(),
                        reason: err.to_string(),
                    },
                    payload: None,
                }
            }
        };

        debug!(
            event_id = %event_id,
            format = %payload.format,
            registration_id = %payload.registration_id,
            "Decoded scan payload"
        );

        let outcome = self
            .check_in(&payload, event_id)
            .await
            .unwrap_or_else(VerificationOutcome::internal);

        CheckInReport {
            outcome,
            payload: Some(payload),
        }
    }

    async fn event_accessible(
        &self,
        event_id: Uuid,
        requester: Requester,
    ) -> Result<bool, StoreError> {
        match requester {
            Requester::Organizer { user_id } => {
                self.bounded(self.events.is_owned_by(event_id, user_id))
                    .await
            }
            Requester::Public => self.bounded(self.events.exists(event_id)).await,
        }
    }

    async fn check_in(
        &self,
        payload: &ScanPayload,
        context_event_id: Uuid,
    ) -> Result<VerificationOutcome, StoreError> {
        let scope = if payload.has_event_id() {
            payload.event_id.clone()
        } else {
            context_event_id.to_string()
        };
        let not_found = || VerificationOutcome::RegistrationNotFound {
            registration_id: payload.registration_id.clone(),
            event_id: scope.clone(),
        };

        // A payload naming another event can never match a registration here.
        let event_id = match Uuid::parse_str(&scope) {
            Ok(id) if id == context_event_id => id,
            _ => return Ok(not_found()),
        };
        let Ok(registration_id) = Uuid::parse_str(&payload.registration_id) else {
            return Ok(not_found());
        };

        let Some(registration) = self
            .bounded(self.registrations.find_in_event(registration_id, event_id))
            .await?
        else {
            return Ok(not_found());
        };

        if registration.verified {
            return Ok(VerificationOutcome::AlreadyVerified(registration.summary()));
        }

        if let Some(updated) = self
            .bounded(self.registrations.mark_verified(registration_id, event_id))
            .await?
        {
            return Ok(VerificationOutcome::VerifiedNow(updated.summary()));
        }

        info!(
            registration_id = %registration_id,
            event_id = %event_id,
            "Concurrent check-in won the transition"
        );

        Ok(self
            .bounded(self.registrations.find_in_event(registration_id, event_id))
            .await?
            .map(|current| VerificationOutcome::AlreadyVerified(current.summary()))
            .unwrap_or_else(not_found))
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.storage_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.storage_timeout))?
    }
}
