//! Event domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Active,
    Ended,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "ACTIVE",
            EventStatus::Ended => "ENDED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(EventStatus::Active),
            "ENDED" => Ok(EventStatus::Ended),
            "CANCELLED" => Ok(EventStatus::Cancelled),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An organizer-owned event that attendees register for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<String>,
    pub location: String,
    pub status: EventStatus,
    pub max_attendees: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Only active events take new self-registrations.
    pub fn accepts_registrations(&self) -> bool {
        self.status == EventStatus::Active
    }

    /// Returns true when `registration_count` has reached the capacity bound.
    pub fn is_full(&self, registration_count: i64) -> bool {
        match self.max_attendees {
            Some(max) => registration_count >= i64::from(max),
            None => false,
        }
    }

    pub fn public_info(&self) -> PublicEventInfo {
        PublicEventInfo {
            title: self.title.clone(),
            event_date: self.event_date,
            event_time: self.event_time.clone(),
            location: self.location.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// Event details shown alongside a registration on the public verification page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicEventInfo {
    pub title: String,
    pub event_date: NaiveDate,
    pub event_time: Option<String>,
    pub location: String,
    pub slug: String,
}

/// Public event page data, including how many places are left.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicEventResponse {
    #[serde(flatten)]
    pub event: PublicEventInfo,
    pub description: Option<String>,
    pub status: EventStatus,
    pub registration_count: i64,
    pub max_attendees: Option<i32>,
    /// `None` when the event has no capacity bound.
    pub spots_remaining: Option<i64>,
    pub accepting_registrations: bool,
}

impl PublicEventResponse {
    pub fn new(event: &Event, registration_count: i64) -> Self {
        Self {
            event: event.public_info(),
            description: event.description.clone(),
            status: event.status,
            registration_count,
            max_attendees: event.max_attendees,
            spots_remaining: event
                .max_attendees
                .map(|max| (i64::from(max) - registration_count).max(0)),
            accepting_registrations: event.accepts_registrations()
                && !event.is_full(registration_count),
        }
    }
}
