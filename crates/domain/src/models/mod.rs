//! Domain models for event check-in.

pub mod check_in;
pub mod event;
pub mod registration;

pub use check_in::{CheckInResponse, CheckInStatus, PublicVerifyScanRequest, VerifyScanRequest};
pub use event::{Event, EventStatus, PublicEventInfo, PublicEventResponse};
pub use registration::{Registration, RegistrationSummary};
