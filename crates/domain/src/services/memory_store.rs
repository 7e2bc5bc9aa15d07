//! In-memory check-in store for development and testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::check_in::{EventStore, RegistrationStore, StoreError};
use crate::models::Registration;

#[derive(Debug, Default)]
struct State {
    /// Event ID to organizer ID.
    events: HashMap<Uuid, Uuid>,
    registrations: HashMap<Uuid, Registration>,
    transitions: usize,
    failure: Option<String>,
}

/// Mutex-backed store implementing both [`EventStore`] and
/// [`RegistrationStore`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckInStore {
    state: Arc<Mutex<State>>,
    latency: Option<Duration>,
}

impl InMemoryCheckInStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every store call by `latency` before it touches state.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every subsequent call fail with a backend error.
    pub fn fail_with(&self, message: &str) {
        self.lock().failure = Some(message.to_string());
    }

    pub fn add_event(&self, event_id: Uuid, organizer_id: Uuid) {
        self.lock().events.insert(event_id, organizer_id);
    }

    pub fn add_registration(&self, registration: Registration) {
        self.lock()
            .registrations
            .insert(registration.id, registration);
    }

    pub fn registration(&self, registration_id: Uuid) -> Option<Registration> {
        self.lock().registrations.get(&registration_id).cloned()
    }

    /// Number of successful false-to-true transitions performed.
    pub fn transition_count(&self) -> usize {
        self.lock().transitions
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let state = self.lock();
        match &state.failure {
            Some(message) => Err(StoreError::Backend(message.clone())),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl EventStore for InMemoryCheckInStore {
    async fn is_owned_by(&self, event_id: Uuid, organizer_id: Uuid) -> Result<bool, StoreError> {
        let state = self.enter().await?;
        Ok(state.events.get(&event_id) == Some(&organizer_id))
    }

    async fn exists(&self, event_id: Uuid) -> Result<bool, StoreError> {
        let state = self.enter().await?;
        Ok(state.events.contains_key(&event_id))
    }
}

#[async_trait]
impl RegistrationStore for InMemoryCheckInStore {
    async fn find_in_event(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        let state = self.enter().await?;
        Ok(state
            .registrations
            .get(&registration_id)
            .filter(|r| r.event_id == event_id)
            .cloned())
    }

    async fn mark_verified(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        let mut state = self.enter().await?;
        let updated = match state.registrations.get_mut(&registration_id) {
            Some(r) if r.event_id == event_id && !r.verified => {
                r.verified = true;
                r.verified_at = Some(Utc::now());
                Some(r.clone())
            }
            _ => None,
        };
        if updated.is_some() {
            state.transitions += 1;
        }
        Ok(updated)
    }
}
